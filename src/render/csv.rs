//! CSV depth-matrix export.
//!
//! One row per written level: station columns, the level depth and its
//! error flag, then a value and error-flag pair for the selected variable
//! or for every named variable code. Casts missing the selected variable
//! produce no rows.

use std::io::Write;

use crate::config::{DepthSlice, ExportConfig, VariableSelection};
use crate::constants::{VARIABLE_NAMES, sentinels, variable_name};
use crate::enrichment::resolve_depths;
use crate::error::Result;
use crate::reader::Cast;
use crate::render::{CastSink, render_precision};

const STATION_COLUMNS: &str =
    "ISO_country,Cruise_ID,Latitude,Longitude,Year,Month,Day,Time,WOD_unique,depth(m),qc_flag";

/// Writes casts as comma-separated rows
pub struct CsvRenderer<W: Write> {
    out: W,
    config: ExportConfig,
    rows_written: usize,
}

impl<W: Write> CsvRenderer<W> {
    pub fn new(out: W, config: ExportConfig) -> Self {
        Self {
            out,
            config,
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Column of the matrix for each output variable, in output order
    fn columns(&self, cast: &Cast<'_>) -> Option<Vec<Option<usize>>> {
        match self.config.variable {
            VariableSelection::Code(code) => {
                cast.record.variable_index(code).map(|column| vec![Some(column)])
            }
            VariableSelection::All => Some(
                (1..=VARIABLE_NAMES.len() as i32)
                    .map(|code| cast.record.variable_index(code))
                    .collect(),
            ),
        }
    }

    /// Levels to write, in output order
    fn selected_levels(
        &self,
        cast: &Cast<'_>,
        depths: &[Option<f64>],
        columns: &[Option<usize>],
    ) -> Vec<usize> {
        let levels = cast.matrix.levels();
        let selected_column = match self.config.variable {
            VariableSelection::Code(_) => columns.first().copied().flatten(),
            VariableSelection::All => None,
        };
        let eligible = |level: usize| {
            selected_column.is_none_or(|column| {
                cast.matrix
                    .measurement(column, level)
                    .is_some_and(|m| m.value.significant_figures > 0)
            })
        };

        match self.config.depth_slice {
            DepthSlice::All => (0..levels).filter(|&l| eligible(l)).collect(),
            DepthSlice::Surface => (0..levels).find(|&l| eligible(l)).into_iter().collect(),
            DepthSlice::Bottom => (0..levels).rev().find(|&l| eligible(l)).into_iter().collect(),
            DepthSlice::Interval { min, max } => (0..levels)
                .filter(|&l| eligible(l))
                .filter(|&l| depths[l].is_some_and(|z| z >= min && z <= max))
                .collect(),
        }
    }

    fn write_row(
        &mut self,
        cast: &Cast<'_>,
        level: usize,
        depth: Option<f64>,
        columns: &[Option<usize>],
    ) -> Result<()> {
        let r = cast.record;
        write!(
            self.out,
            "{:>2},{},{:.3},{:.3},{:4},{:2},{:2},",
            r.country_code,
            r.cruise_number,
            r.latitude.scaled(),
            r.longitude.scaled(),
            r.year,
            r.month,
            r.day
        )?;

        let hour = r.time.scaled();
        if (0.0..=24.0).contains(&hour) {
            write!(self.out, "{hour:.2},")?;
        } else {
            write!(self.out, ",")?;
        }
        write!(self.out, "{},", r.cast_number)?;

        if let Some(cell) = cast.matrix.depth(level) {
            let precision = cell
                .depth
                .map_or(0, |f| usize::from(f.right_of_decimal_figures));
            let z = cell
                .depth
                .map(|f| f.scaled())
                .or(depth)
                .unwrap_or(f64::from(sentinels::MISSING));
            write!(self.out, "{:.*},{}", precision, z, cell.error_flag)?;
        }

        for column in columns {
            match column.and_then(|c| cast.matrix.measurement(c, level)) {
                Some(m) => write!(
                    self.out,
                    ",{:.*},{}",
                    render_precision(&m.value),
                    m.value.scaled(),
                    m.error_flag
                )?,
                None => write!(self.out, ",,")?,
            }
        }
        writeln!(self.out)?;
        self.rows_written += 1;
        Ok(())
    }
}

impl<W: Write> CastSink for CsvRenderer<W> {
    fn begin(&mut self) -> Result<()> {
        write!(self.out, "{STATION_COLUMNS}")?;
        match self.config.variable {
            VariableSelection::Code(code) => {
                let name = variable_name(code).unwrap_or("unknown");
                write!(self.out, ",{name},qc_flag")?;
            }
            VariableSelection::All => {
                for name in VARIABLE_NAMES {
                    write!(self.out, ",{name},qc_flag")?;
                }
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn write_cast(&mut self, _index: usize, cast: &Cast<'_>) -> Result<bool> {
        if cast.matrix.levels() == 0 {
            return Ok(false);
        }
        let Some(columns) = self.columns(cast) else {
            return Ok(false);
        };

        let depths = resolve_depths(cast, self.config.backfill_standard_depths);
        let levels = self.selected_levels(cast, &depths, &columns);
        for &level in &levels {
            self.write_row(cast, level, depths[level], &columns)?;
        }
        Ok(!levels.is_empty())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
