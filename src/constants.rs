//! Format constants for WOD native ASCII casts
//!
//! This module contains the missing-value sentinels, fixed field widths,
//! default buffer capacities and lookup tables used by the decoder and
//! the renderers.

// =============================================================================
// Format Version Tags
// =============================================================================

/// Format tag bytes found at the start of every cast
pub mod format_tags {
    /// WOD01 format
    pub const WOD01: u8 = b'A';

    /// WOD05 / WOD09 format
    pub const WOD05: u8 = b'B';

    /// WOD13 format (newest sub-version)
    pub const WOD13: u8 = b'C';
}

// =============================================================================
// Missing-Value Sentinels
// =============================================================================

/// Values stored in a field whose measured encoding starts with `-`
pub mod sentinels {
    /// Generic missing marker (measurements, depths, headers, taxa)
    pub const MISSING: i32 = -9999;

    /// Missing time of day
    pub const TIME: i32 = 9999;

    /// Missing latitude
    pub const LATITUDE: i32 = -9999;

    /// Missing longitude
    pub const LONGITUDE: i32 = -99999;
}

// =============================================================================
// Fixed Field Widths
// =============================================================================

/// Digit counts for fields whose width is implied by their position
pub mod widths {
    pub const YEAR: u8 = 4;
    pub const MONTH: u8 = 2;
    pub const DAY: u8 = 2;

    /// Observed (0) / standard (1) level flag
    pub const LEVEL_TYPE: u8 = 1;

    /// Number of variables in the cast
    pub const VARIABLE_COUNT: u8 = 2;

    /// Error and originator flags on every level, variable and taxon
    pub const FLAG: u8 = 1;

    /// Number of entries in the character block
    pub const INFO_COUNT: u8 = 1;

    /// Character block entry selector
    pub const INFO_TYPE: u8 = 1;

    /// Length prefix of originator cruise/station codes
    pub const TEXT_LENGTH: u8 = 2;

    /// Number of primary investigators
    pub const INVESTIGATOR_COUNT: u8 = 2;

    /// Country code characters
    pub const COUNTRY_CODE: usize = 2;
}

/// Character block entry selectors
pub mod info_types {
    pub const ORIGINATOR_CRUISE: i32 = 1;
    pub const ORIGINATOR_STATION: i32 = 2;
    pub const INVESTIGATORS: i32 = 3;
}

// =============================================================================
// Buffer Capacities
// =============================================================================

/// Slots reserved per taxa set in the growable store
pub const DEFAULT_TAXA_SLOTS_PER_SET: usize = 30;

/// Taxa sets pre-allocated for a new session
pub const DEFAULT_INITIAL_TAXA_SETS: usize = 1;

/// Depth levels pre-allocated for a new session
pub const DEFAULT_INITIAL_LEVELS: usize = 137;

/// Variable-level cells pre-allocated for a new session
pub const DEFAULT_INITIAL_CELLS: usize = 137;

/// Largest scale exponent honoured when rendering values
pub const MAX_RENDER_PRECISION: u8 = 6;

// =============================================================================
// Standard Depth Levels
// =============================================================================

/// Standard depths (m) substituted for legacy standard-level casts that omit
/// their depth column
pub const LEGACY_STANDARD_DEPTHS: [f64; 40] = [
    0.0, 10.0, 20.0, 30.0, 50.0, 75.0, 100.0, 125.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0,
    600.0, 700.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1300.0, 1400.0, 1500.0, 1750.0, 2000.0,
    2500.0, 3000.0, 3500.0, 4000.0, 4500.0, 5000.0, 5500.0, 6000.0, 6500.0, 7000.0, 7500.0,
    8000.0, 8500.0, 9000.0,
];

// =============================================================================
// Variable Names
// =============================================================================

/// Short names of WOD variable codes 1..=43, used as CSV column headers
pub const VARIABLE_NAMES: [&str; 43] = [
    "Temp", "Sal", "Oxy", "Phos", "dum5", "Sil", "dum7", "NO3", "pH", "dum10", "Chl", "dum12",
    "dum13", "dum14", "dum15", "dum16", "Alk", "dum18", "dum19", "pCO2", "DIC", "dum22", "dum23",
    "BAC", "dum25", "dum26", "dum27", "dum28", "dum29", "dum30", "dum31", "dum32", "Trit", "He",
    "dHE3", "dC14", "dC13", "Arg", "Neo", "CFC11", "CFC12", "CFC113", "O18",
];

/// Column name for a variable code, if it has one
pub fn variable_name(code: i32) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|c| c.checked_sub(1))
        .and_then(|idx| VARIABLE_NAMES.get(idx).copied())
}

/// Taxon code that opens a new taxon within a taxa set
pub const TAXON_CODE: i32 = 1;
