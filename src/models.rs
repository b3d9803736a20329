//! Core data structures for decoded WOD casts.
//!
//! Defines the per-field precision model, the cast header and its nested
//! blocks, the per-level cells held by the growable store, and the
//! processing statistics reported by a session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::format_tags;

/// One decoded scalar together with its encoded precision metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Integer value, or the caller's sentinel when missing
    pub value: i32,
    pub significant_figures: u8,
    pub total_figures: u8,
    pub right_of_decimal_figures: u8,
    pub is_missing: bool,
}

impl Field {
    /// Field carrying explicit precision metadata
    pub fn new(
        value: i32,
        significant_figures: u8,
        total_figures: u8,
        right_of_decimal_figures: u8,
    ) -> Self {
        Self {
            value,
            significant_figures,
            total_figures,
            right_of_decimal_figures,
            is_missing: false,
        }
    }

    /// Field decoded without significance or scale metadata
    pub fn integer(value: i32, total_figures: u8) -> Self {
        Self::new(value, 0, total_figures, 0)
    }

    /// Missing-value field: sentinel value, all figure counts zero
    pub fn missing(sentinel: i32) -> Self {
        Self {
            value: sentinel,
            significant_figures: 0,
            total_figures: 0,
            right_of_decimal_figures: 0,
            is_missing: true,
        }
    }

    /// `value / 10^right_of_decimal_figures`, sentinel included
    pub fn scaled(&self) -> f64 {
        f64::from(self.value) / 10f64.powi(i32::from(self.right_of_decimal_figures))
    }

    /// Real-valued magnitude, or `None` for a missing field
    pub fn to_f64(&self) -> Option<f64> {
        (!self.is_missing).then(|| self.scaled())
    }
}

/// On-disk sub-version announced by the first byte of a cast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    /// `A`: WOD01
    Wod01,
    /// `B`: WOD05 and WOD09
    Wod05,
    /// `C`: WOD13
    #[default]
    Wod13,
    /// Any other tag byte
    Unknown(char),
}

impl FormatTag {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            format_tags::WOD01 => FormatTag::Wod01,
            format_tags::WOD05 => FormatTag::Wod05,
            format_tags::WOD13 => FormatTag::Wod13,
            other => FormatTag::Unknown(char::from(other)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            FormatTag::Wod01 => char::from(format_tags::WOD01),
            FormatTag::Wod05 => char::from(format_tags::WOD05),
            FormatTag::Wod13 => char::from(format_tags::WOD13),
            FormatTag::Unknown(c) => *c,
        }
    }

    /// Newest sub-version always encodes depth and never takes standard-depth back-fill
    pub fn is_newest(&self) -> bool {
        matches!(self, FormatTag::Wod13)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FormatTag::Unknown(_))
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Whether a cast reports observed depths or interpolated standard levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelType {
    #[default]
    Observed,
    Standard,
}

impl LevelType {
    pub fn from_flag(flag: i32) -> Self {
        if flag == 0 {
            LevelType::Observed
        } else {
            LevelType::Standard
        }
    }
}

/// Variable-specific secondary header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSecondaryHeader {
    pub code: i32,
    pub value: Field,
}

/// One measured variable announced in the cast header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub code: i32,
    /// Whole-profile error flag
    pub error_flag: u8,
    pub secondary_headers: Vec<VariableSecondaryHeader>,
}

/// Primary investigator responsible for one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investigator {
    pub variable_code: i32,
    pub investigator_code: i32,
}

/// Originator codes and investigators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBlock {
    pub originator_cruise: Option<String>,
    pub originator_station: Option<String>,
    pub investigators: Vec<Investigator>,
}

impl CharacterBlock {
    pub fn is_empty(&self) -> bool {
        self.originator_cruise.is_none()
            && self.originator_station.is_none()
            && self.investigators.is_empty()
    }
}

/// Cast-level secondary or biological header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub code: i32,
    pub value: Field,
}

/// Header and descriptor blocks of one cast
///
/// The depth/measurement matrix and taxa sets live in the session's
/// [`GrowableStore`](crate::store::GrowableStore) and are exposed through
/// [`Cast`](crate::reader::Cast).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CastRecord {
    pub format: FormatTag,
    /// Byte count announced by the cast; informational only
    pub byte_count: i32,
    pub cast_number: i32,
    pub country_code: String,
    pub cruise_number: i32,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub time: Field,
    pub latitude: Field,
    pub longitude: Field,
    pub levels: usize,
    pub level_type: LevelType,
    pub variables: Vec<VariableDescriptor>,
    pub character: CharacterBlock,
    pub secondary_headers: Vec<HeaderEntry>,
    pub biological_headers: Vec<HeaderEntry>,
}

impl CastRecord {
    /// Reset for reuse by the next cast, keeping allocated capacity
    pub fn clear(&mut self) {
        self.format = FormatTag::default();
        self.byte_count = 0;
        self.cast_number = 0;
        self.country_code.clear();
        self.cruise_number = 0;
        self.year = 0;
        self.month = 0;
        self.day = 0;
        self.time = Field::default();
        self.latitude = Field::default();
        self.longitude = Field::default();
        self.levels = 0;
        self.level_type = LevelType::default();
        self.variables.clear();
        self.character = CharacterBlock::default();
        self.secondary_headers.clear();
        self.biological_headers.clear();
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Column of the measurement matrix holding `code`, last declaration wins
    pub fn variable_index(&self, code: i32) -> Option<usize> {
        self.variables.iter().rposition(|v| v.code == code)
    }

    /// Calendar date, when year/month/day form a valid date (day 0 marks unknown)
    pub fn date(&self) -> Option<NaiveDate> {
        let month = u32::try_from(self.month).ok()?;
        let day = u32::try_from(self.day).ok()?;
        NaiveDate::from_ymd_opt(self.year, month, day)
    }

    /// Variable-specific secondary headers paired with their variable code
    pub fn variable_secondary_headers(
        &self,
    ) -> impl Iterator<Item = (i32, &VariableSecondaryHeader)> + '_ {
        self.variables
            .iter()
            .flat_map(|v| v.secondary_headers.iter().map(move |h| (v.code, h)))
    }
}

/// Depth cell of one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// `None` when the cast did not encode depth for this level
    pub depth: Option<Field>,
    pub error_flag: u8,
    pub originator_flag: u8,
}

/// One variable at one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Field,
    pub error_flag: u8,
    pub originator_flag: u8,
}

/// One entry of a taxa set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonEntry {
    pub taxon_code: i32,
    pub value: Field,
    pub error_flag: u8,
    pub originator_flag: u8,
}

/// Processing statistics for one session
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub casts_read: usize,
    pub casts_rendered: usize,
    pub levels_decoded: usize,
    pub cells_decoded: usize,
    pub growth_events: usize,
    /// Earliest and latest valid cast dates seen
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Set when the session stopped on an undecodable cast
    pub malformed_record: Option<String>,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn record_date(&mut self, date: NaiveDate) {
        self.date_range = Some(match self.date_range {
            Some((first, last)) => (first.min(date), last.max(date)),
            None => (date, date),
        });
    }
}
