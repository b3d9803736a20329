//! Cast-by-cast reader for WOD native ASCII files.
//!
//! A cast is a fixed sequence of positional steps with no markers between
//! blocks. [`CastReader`] walks [`CastStep::ORDER`] once per cast, writing
//! the header into a reused [`CastRecord`] and the variable-size parts into
//! the session's [`GrowableStore`]. A cast is either returned whole or not
//! at all: running out of input mid-cast ends the session without a
//! partial record.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::blocks::BlockDecoder;
use crate::config::ReaderConfig;
use crate::constants::{sentinels, widths};
use crate::error::{Result, WodError};
use crate::field::{FieldDecoder, TextLength};
use crate::models::{CastRecord, FormatTag, LevelType};
use crate::store::{GrowableStore, LevelMatrix, TaxaSets};

/// Grammar steps of one cast, in stream order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStep {
    FormatTag,
    ByteCount,
    CastNumber,
    CountryCode,
    CruiseNumber,
    Date,
    TimeAndPosition,
    Levels,
    Variables,
    CharacterBlock,
    SecondaryHeaders,
    Biology,
    LevelMatrix,
    EndOfRecord,
}

impl CastStep {
    pub const ORDER: [CastStep; 14] = [
        CastStep::FormatTag,
        CastStep::ByteCount,
        CastStep::CastNumber,
        CastStep::CountryCode,
        CastStep::CruiseNumber,
        CastStep::Date,
        CastStep::TimeAndPosition,
        CastStep::Levels,
        CastStep::Variables,
        CastStep::CharacterBlock,
        CastStep::SecondaryHeaders,
        CastStep::Biology,
        CastStep::LevelMatrix,
        CastStep::EndOfRecord,
    ];
}

/// Whether a cast carries an explicit depth for each level
pub fn depth_is_encoded(format: FormatTag, level_type: LevelType) -> bool {
    level_type == LevelType::Observed || format.is_newest()
}

/// One fully decoded cast, borrowed from the reader until the next call
#[derive(Debug, Clone, Copy)]
pub struct Cast<'a> {
    pub record: &'a CastRecord,
    pub matrix: LevelMatrix<'a>,
    pub taxa: TaxaSets<'a>,
}

impl Cast<'_> {
    /// False for legacy standard-level casts whose depths come from the standard table
    pub fn depth_encoded(&self) -> bool {
        depth_is_encoded(self.record.format, self.record.level_type)
    }
}

/// Sequential cast reader owning the session buffers
pub struct CastReader<R> {
    fields: FieldDecoder<R>,
    store: GrowableStore,
    record: CastRecord,
    taxa_sets: usize,
    nparm: usize,
    config: ReaderConfig,
    casts_read: usize,
}

impl CastReader<BufReader<File>> {
    /// Open a WOD file for reading from its first cast
    pub fn open(path: &Path, config: ReaderConfig) -> Result<Self> {
        if !path.exists() {
            return Err(WodError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        debug!("Opened WOD file {}", path.display());
        Self::with_config(BufReader::new(file), config)
    }
}

impl<R: BufRead> CastReader<R> {
    /// Reader with default capacities that accepts any format tag
    pub fn new(source: R) -> Result<Self> {
        Self::with_config(source, ReaderConfig::default())
    }

    pub fn with_config(source: R, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fields: FieldDecoder::new(source),
            store: GrowableStore::new(&config)?,
            record: CastRecord::default(),
            taxa_sets: 0,
            nparm: 0,
            config,
            casts_read: 0,
        })
    }

    /// Decode the next cast.
    ///
    /// Returns `Ok(None)` once the input is exhausted, including when it
    /// ends partway through a cast.
    pub fn next_cast(&mut self) -> Result<Option<Cast<'_>>> {
        if self.fields.cursor_mut().only_noise_remains()? {
            return Ok(None);
        }

        self.record.clear();
        self.taxa_sets = 0;
        self.nparm = 0;

        for step in CastStep::ORDER {
            match self.decode_step(step) {
                Ok(()) => {}
                Err(WodError::EndOfStream) => {
                    warn!(
                        "Input ended during {:?} of cast {}; discarding partial cast",
                        step,
                        self.casts_read + 1
                    );
                    return Ok(None);
                }
                Err(e @ WodError::MalformedRecord { .. }) => {
                    warn!("Cast {} is malformed at {:?}: {}", self.casts_read + 1, step, e);
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
        }

        self.casts_read += 1;
        trace!(
            "Decoded cast {} ({} levels, {} variables)",
            self.record.cast_number,
            self.record.levels,
            self.nparm
        );
        Ok(Some(self.current()))
    }

    /// Casts returned so far
    pub fn casts_read(&self) -> usize {
        self.casts_read
    }

    pub fn store(&self) -> &GrowableStore {
        &self.store
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Bytes consumed from the input so far
    pub fn offset(&self) -> u64 {
        self.fields.offset()
    }

    fn current(&self) -> Cast<'_> {
        Cast {
            record: &self.record,
            matrix: self.store.level_matrix(self.record.levels, self.nparm),
            taxa: self.store.taxa_sets(self.taxa_sets),
        }
    }

    fn decode_step(&mut self, step: CastStep) -> Result<()> {
        let fields = &mut self.fields;
        let record = &mut self.record;
        match step {
            CastStep::FormatTag => {
                let tag = FormatTag::from_byte(fields.cursor_mut().next_byte()?);
                if let Some(required) = self.config.required_format {
                    if tag != required {
                        return Err(WodError::UnsupportedFormatVersion {
                            tag: tag.as_char(),
                        });
                    }
                }
                if !tag.is_known() {
                    warn!("Unknown format tag '{}', decoding as a legacy cast", tag);
                }
                record.format = tag;
            }
            CastStep::ByteCount => record.byte_count = fields.internal()?,
            CastStep::CastNumber => record.cast_number = fields.internal()?,
            CastStep::CountryCode => {
                record.country_code = fields.decode_text(TextLength::Known(widths::COUNTRY_CODE))?;
            }
            CastStep::CruiseNumber => record.cruise_number = fields.internal()?,
            CastStep::Date => {
                record.year = fields.fixed(widths::YEAR)?;
                record.month = fields.fixed(widths::MONTH)?;
                record.day = fields.fixed(widths::DAY)?;
            }
            CastStep::TimeAndPosition => {
                record.time = fields.measured(sentinels::TIME)?;
                record.latitude = fields.measured(sentinels::LATITUDE)?;
                record.longitude = fields.measured(sentinels::LONGITUDE)?;
            }
            CastStep::Levels => {
                record.levels = fields.count("level count")?;
                record.level_type = LevelType::from_flag(fields.fixed(widths::LEVEL_TYPE)?);
            }
            CastStep::Variables => {
                self.nparm = fields.fixed_count(widths::VARIABLE_COUNT, "variable count")?;
                BlockDecoder::new(fields).variables(self.nparm, &mut record.variables)?;
            }
            CastStep::CharacterBlock => {
                record.character = BlockDecoder::new(fields).character_block()?;
            }
            CastStep::SecondaryHeaders => {
                BlockDecoder::new(fields).secondary_headers(&mut record.secondary_headers)?;
            }
            CastStep::Biology => {
                self.taxa_sets = BlockDecoder::new(fields)
                    .biology(&mut self.store, &mut record.biological_headers)?;
            }
            CastStep::LevelMatrix => {
                let depth_encoded = depth_is_encoded(record.format, record.level_type);
                BlockDecoder::new(fields).level_matrix(
                    &mut self.store,
                    record.levels,
                    self.nparm,
                    depth_encoded,
                )?;
            }
            CastStep::EndOfRecord => fields.cursor_mut().skip_line()?,
        }
        Ok(())
    }
}
