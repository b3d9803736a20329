//! Human-readable dump of every block of a cast.

use std::io::Write;

use crate::constants::{TAXON_CODE, sentinels};
use crate::enrichment::resolve_depths;
use crate::error::Result;
use crate::models::Field;
use crate::reader::Cast;
use crate::render::CastSink;

const RULE: &str = "-----------------------------------------------------";

/// Writes each cast as a fixed-layout text report
pub struct DumpRenderer<W: Write> {
    out: W,
    backfill_standard_depths: bool,
}

impl<W: Write> DumpRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            backfill_standard_depths: true,
        }
    }

    pub fn with_backfill(mut self, backfill: bool) -> Self {
        self.backfill_standard_depths = backfill;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_banner(&mut self, index: usize) -> Result<()> {
        write!(self.out, " \n{RULE}\n")?;
        writeln!(self.out, " OUTPUT FROM ASCII FILE: CAST #{index}")?;
        write!(self.out, "{RULE}\n\n")?;
        Ok(())
    }

    fn write_station(&mut self, cast: &Cast<'_>) -> Result<()> {
        let r = cast.record;
        writeln!(
            self.out,
            " CC  Cruise Latitude Longitude YYYY MM DD  Time Cast    #Levels"
        )?;
        write!(
            self.out,
            " {:>2}  {:6}  {:7.3}  {:8.3} {:4} {:2} {:2} {:5.2} {:8} {:4}\n\n\n",
            r.country_code,
            r.cruise_number,
            r.latitude.scaled(),
            r.longitude.scaled(),
            r.year,
            r.month,
            r.day,
            r.time.scaled(),
            r.cast_number,
            r.levels
        )?;
        Ok(())
    }

    fn write_character_block(&mut self, cast: &Cast<'_>) -> Result<()> {
        let block = &cast.record.character;
        if let Some(code) = &block.originator_cruise {
            writeln!(self.out, " ORIGINATORS CRUISE CODE: {code}")?;
        }
        if let Some(code) = &block.originator_station {
            writeln!(self.out, " ORIGINATORS STATION CODE: {code}")?;
        }
        if block.originator_cruise.is_some() || block.originator_station.is_some() {
            writeln!(self.out)?;
        }

        for pi in &block.investigators {
            writeln!(
                self.out,
                " PRIMARY INVESTIGATOR: {:4} ... for variable #{:2}",
                pi.investigator_code, pi.variable_code
            )?;
        }
        if !block.investigators.is_empty() {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_profiles(&mut self, cast: &Cast<'_>) -> Result<()> {
        let matrix = &cast.matrix;
        if matrix.levels() == 0 {
            return Ok(());
        }

        write!(self.out, "      z          ")?;
        for variable in &cast.record.variables {
            write!(self.out, "  {:2}            ", variable.code)?;
        }
        write!(self.out, "\n\n")?;

        let depths = resolve_depths(cast, self.backfill_standard_depths);
        for (level, cell) in matrix.depths().iter().enumerate() {
            let depth = match cell.depth {
                Some(field) => field.scaled(),
                None => depths[level].unwrap_or(f64::from(sentinels::MISSING)),
            };
            let significant = cell.depth.map_or(0, |f| f.significant_figures);
            write!(
                self.out,
                " {:7.1} ({}) [{}{}]",
                depth, significant, cell.error_flag, cell.originator_flag
            )?;

            for variable in 0..matrix.variable_count() {
                if let Some(m) = matrix.measurement(variable, level) {
                    write!(
                        self.out,
                        "{:7.3} ({}) [{}{}]",
                        m.value.scaled(),
                        m.value.significant_figures,
                        m.error_flag,
                        m.originator_flag
                    )?;
                }
            }
            writeln!(self.out)?;
        }

        write!(self.out, "\n ERR:           ")?;
        for variable in &cast.record.variables {
            write!(self.out, "              {} ", variable.error_flag)?;
        }
        write!(self.out, "\n\n")?;
        Ok(())
    }

    fn write_headers(&mut self, cast: &Cast<'_>) -> Result<()> {
        let r = cast.record;
        for header in &r.secondary_headers {
            write!(self.out, "   Second header #{:3}  ", header.code)?;
            self.write_header_value(&header.value)?;
        }
        writeln!(self.out)?;

        for (variable, header) in r.variable_secondary_headers() {
            write!(
                self.out,
                "   Variable #{:3} Second header #{:3}  ",
                variable, header.code
            )?;
            self.write_header_value(&header.value)?;
        }
        writeln!(self.out)?;

        for header in &r.biological_headers {
            write!(self.out, "   Biology header #{:3}  ", header.code)?;
            self.write_header_value(&header.value)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn write_header_value(&mut self, value: &Field) -> Result<()> {
        if value.right_of_decimal_figures > 0 {
            writeln!(
                self.out,
                "{:9.3} ({})",
                value.scaled(),
                value.significant_figures
            )?;
        } else {
            writeln!(self.out, "{:9} ({})", value.value, value.significant_figures)?;
        }
        Ok(())
    }

    fn write_taxa(&mut self, cast: &Cast<'_>) -> Result<()> {
        for (set, entries) in cast.taxa.sets().enumerate() {
            for entry in entries {
                let v = &entry.value;
                let flags = (entry.error_flag, entry.originator_flag);
                if entry.taxon_code == TAXON_CODE {
                    write!(
                        self.out,
                        "\n Taxa-set {:3}: Taxonomic Code[1]# {:10} ({}) [{}{}]\n",
                        set + 1,
                        v.value,
                        v.significant_figures,
                        flags.0,
                        flags.1
                    )?;
                } else if v.right_of_decimal_figures > 0 {
                    writeln!(
                        self.out,
                        "        Code #{:2}        {:8.3} ({}) [{}{}]",
                        entry.taxon_code,
                        v.scaled(),
                        v.significant_figures,
                        flags.0,
                        flags.1
                    )?;
                } else {
                    writeln!(
                        self.out,
                        "        Code #{:2}        {:8} ({}) [{}{}]",
                        entry.taxon_code, v.value, v.significant_figures, flags.0, flags.1
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> CastSink for DumpRenderer<W> {
    fn write_cast(&mut self, index: usize, cast: &Cast<'_>) -> Result<bool> {
        self.write_banner(index)?;
        self.write_station(cast)?;
        self.write_character_block(cast)?;
        self.write_profiles(cast)?;
        self.write_headers(cast)?;
        self.write_taxa(cast)?;
        Ok(true)
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
