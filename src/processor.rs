//! Session driver for decoding a WOD file into a sink.
//!
//! Pulls casts from a [`CastReader`] until the input is exhausted or the
//! configured cast limit is reached, hands each to a [`CastSink`] and
//! collects [`ProcessingStats`] for the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, ReaderConfig};
use crate::error::{Result, WodError};
use crate::models::ProcessingStats;
use crate::reader::CastReader;
use crate::render::CastSink;

/// Drives one decoding session
pub struct CastProcessor<R> {
    reader: CastReader<R>,
    config: ExportConfig,
    progress: Option<ProgressBar>,
}

impl CastProcessor<BufReader<File>> {
    /// Processor reading from a WOD file on disk
    pub fn open(path: &Path, reader_config: ReaderConfig, config: ExportConfig) -> Result<Self> {
        let reader = CastReader::open(path, reader_config)?;
        Self::new(reader, config)
    }
}

impl<R: BufRead> CastProcessor<R> {
    pub fn new(reader: CastReader<R>, config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader,
            config,
            progress: None,
        })
    }

    /// Show a spinner on stderr while casts are processed
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {pos} casts {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        self
    }

    pub fn reader(&self) -> &CastReader<R> {
        &self.reader
    }

    /// Decode casts into `sink` until end of input or the cast limit.
    ///
    /// A malformed cast ends the session like end of input and is recorded
    /// in the returned stats. Unsupported format versions, I/O and
    /// allocation failures abort with an error.
    pub fn run<S: CastSink>(&mut self, sink: &mut S) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let mut stats = ProcessingStats::default();

        sink.begin()?;
        loop {
            if self
                .config
                .max_casts
                .is_some_and(|limit| stats.casts_read >= limit)
            {
                debug!("Reached cast limit of {}", stats.casts_read);
                break;
            }

            let cast = match self.reader.next_cast() {
                Ok(Some(cast)) => cast,
                Ok(None) => break,
                Err(e @ WodError::MalformedRecord { .. }) => {
                    warn!("Stopping after {} casts: {}", stats.casts_read, e);
                    stats.malformed_record = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    if let Some(pb) = &self.progress {
                        pb.abandon_with_message("failed");
                    }
                    return Err(e);
                }
            };

            stats.casts_read += 1;
            stats.levels_decoded += cast.matrix.levels();
            stats.cells_decoded += cast.matrix.levels() * cast.matrix.variable_count();
            match cast.record.date() {
                Some(date) => stats.record_date(date),
                None => debug!(
                    "Cast {} has no calendar date ({}-{}-{})",
                    cast.record.cast_number, cast.record.year, cast.record.month, cast.record.day
                ),
            }

            if sink.write_cast(stats.casts_read, &cast)? {
                stats.casts_rendered += 1;
            }

            if let Some(pb) = &self.progress {
                pb.set_position(stats.casts_read as u64);
                pb.set_message(format!("(cast #{})", cast.record.cast_number));
            }
        }
        sink.finish()?;

        if let Some(pb) = &self.progress {
            pb.finish_with_message("done");
        }

        stats.growth_events = self.reader.store().growth_events();
        stats.processing_time_ms = start_time.elapsed().as_millis();
        info!(
            "Processed {} casts ({} levels) in {}ms",
            stats.casts_read, stats.levels_decoded, stats.processing_time_ms
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariableSelection;
    use crate::models::FormatTag;
    use crate::reader::Cast;
    use std::io::Cursor;

    /// Records the cast numbers it receives
    #[derive(Default)]
    struct CollectingSink {
        began: bool,
        finished: bool,
        casts: Vec<(usize, i32)>,
    }

    impl CastSink for CollectingSink {
        fn begin(&mut self) -> Result<()> {
            self.began = true;
            Ok(())
        }

        fn write_cast(&mut self, index: usize, cast: &Cast<'_>) -> Result<bool> {
            self.casts.push((index, cast.record.cast_number));
            Ok(true)
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    /// Two-level WOD13 cast with one variable
    fn cast(number: char) -> String {
        format!(
            concat!(
                "C", "11", "1{}", "US", "11", "19800101", "-", "-", "-",
                "12", "0", "01", "11", "0", "10", "10", "10", "10",
                "1100", "00", "331150", "00", "330100", "00", "331140", "00", "\n",
            ),
            number
        )
    }

    fn processor(input: String, config: ExportConfig) -> CastProcessor<Cursor<Vec<u8>>> {
        let reader = CastReader::new(Cursor::new(input.into_bytes())).unwrap();
        CastProcessor::new(reader, config).unwrap()
    }

    #[test]
    fn test_run_visits_every_cast() {
        let input = format!("{}{}{}", cast('1'), cast('2'), cast('3'));
        let mut sink = CollectingSink::default();
        let stats = processor(input, ExportConfig::default())
            .run(&mut sink)
            .unwrap();

        assert!(sink.began && sink.finished);
        assert_eq!(sink.casts, vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(stats.casts_read, 3);
        assert_eq!(stats.casts_rendered, 3);
        assert_eq!(stats.levels_decoded, 6);
        assert_eq!(stats.cells_decoded, 6);
        assert_eq!(stats.growth_events, 0);
        assert!(stats.malformed_record.is_none());

        let day = chrono::NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
        assert_eq!(stats.date_range, Some((day, day)));
    }

    #[test]
    fn test_max_casts_limits_session() {
        let input = format!("{}{}{}", cast('1'), cast('2'), cast('3'));
        let mut sink = CollectingSink::default();
        let config = ExportConfig::default().with_max_casts(2);
        let stats = processor(input, config).run(&mut sink).unwrap();
        assert_eq!(stats.casts_read, 2);
        assert_eq!(sink.casts.len(), 2);
    }

    #[test]
    fn test_malformed_cast_ends_session() {
        let input = format!("{}C1X", cast('1'));
        let mut sink = CollectingSink::default();
        let stats = processor(input, ExportConfig::default())
            .run(&mut sink)
            .unwrap();
        assert_eq!(stats.casts_read, 1);
        assert!(stats.malformed_record.is_some());
        assert!(sink.finished);
    }

    #[test]
    fn test_unsupported_format_aborts() {
        let input = cast('1').replacen('C', "A", 1);
        let config = ReaderConfig::default().with_required_format(FormatTag::Wod13);
        let reader = CastReader::with_config(Cursor::new(input.into_bytes()), config).unwrap();
        let mut sink = CollectingSink::default();
        let result = CastProcessor::new(reader, ExportConfig::default())
            .unwrap()
            .run(&mut sink);
        assert!(matches!(
            result,
            Err(WodError::UnsupportedFormatVersion { tag: 'A' })
        ));
    }

    #[test]
    fn test_failed_growth_aborts_session() {
        // one taxa set of one entry
        let input = concat!(
            "C", "11", "11", "US", "11", "19800101", "-", "-", "-",
            "12", "0", "01", "11", "0", "10", "10", "10",
            "214", "10", "11", "11", "11", "1105", "00",
            "1100", "00", "331150", "00", "330100", "00", "331140", "00", "\n",
        );
        let config = ReaderConfig {
            initial_taxa_sets: 0,
            ..ReaderConfig::default().with_taxa_slots_per_set(usize::MAX / 2)
        };
        let reader =
            CastReader::with_config(Cursor::new(input.as_bytes().to_vec()), config).unwrap();
        let mut sink = CollectingSink::default();
        let result = CastProcessor::new(reader, ExportConfig::default())
            .unwrap()
            .run(&mut sink);

        assert!(matches!(
            result,
            Err(WodError::Allocation {
                axis: crate::store::Axis::TaxaSets,
                ..
            })
        ));
        assert!(sink.casts.is_empty());
        assert!(!sink.finished);
    }

    #[test]
    fn test_invalid_export_config_is_rejected() {
        let reader = CastReader::new(Cursor::new(Vec::new())).unwrap();
        let config = ExportConfig::default().with_variable(VariableSelection::Code(99));
        assert!(CastProcessor::new(reader, config).is_err());
    }
}
