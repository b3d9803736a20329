//! Configuration management and validation.
//!
//! Provides the decoder settings (initial buffer capacities, accepted
//! format versions) and the export settings used by the renderers
//! (cast limit, variable selection, depth slice).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_INITIAL_CELLS, DEFAULT_INITIAL_LEVELS, DEFAULT_INITIAL_TAXA_SETS,
    DEFAULT_TAXA_SLOTS_PER_SET, VARIABLE_NAMES,
};
use crate::error::{Result, WodError};
use crate::models::FormatTag;

/// Settings for one decoding session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Taxa sets pre-allocated before the first cast
    pub initial_taxa_sets: usize,

    /// Maximum entries in a single taxa set
    pub taxa_slots_per_set: usize,

    /// Depth levels pre-allocated before the first cast
    pub initial_levels: usize,

    /// Variable-level cells pre-allocated before the first cast
    pub initial_cells: usize,

    /// Only accept casts with this format tag; `None` decodes any tag best-effort
    pub required_format: Option<FormatTag>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_taxa_sets: DEFAULT_INITIAL_TAXA_SETS,
            taxa_slots_per_set: DEFAULT_TAXA_SLOTS_PER_SET,
            initial_levels: DEFAULT_INITIAL_LEVELS,
            initial_cells: DEFAULT_INITIAL_CELLS,
            required_format: None,
        }
    }
}

impl ReaderConfig {
    /// Reject casts whose format tag differs from `format`
    pub fn with_required_format(mut self, format: FormatTag) -> Self {
        self.required_format = Some(format);
        self
    }

    /// Set initial capacities for the depth and measurement axes
    pub fn with_initial_capacity(mut self, levels: usize, cells: usize) -> Self {
        self.initial_levels = levels;
        self.initial_cells = cells;
        self
    }

    pub fn with_taxa_slots_per_set(mut self, slots: usize) -> Self {
        self.taxa_slots_per_set = slots;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.taxa_slots_per_set == 0 {
            return Err(WodError::configuration(
                "taxa_slots_per_set must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Which variables a CSV export writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableSelection {
    /// One column pair for every named variable code
    #[default]
    All,
    /// A single variable code
    Code(i32),
}

impl VariableSelection {
    /// Code 0 selects all variables
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            VariableSelection::All
        } else {
            VariableSelection::Code(code)
        }
    }
}

/// Which depth levels of each cast a CSV export writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum DepthSlice {
    #[default]
    All,
    /// Shallowest eligible level only
    Surface,
    /// Deepest eligible level only
    Bottom,
    /// Levels whose depth lies within `[min, max]` metres
    Interval { min: f64, max: f64 },
}

/// Settings for a dump or CSV export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Stop after this many casts; `None` reads to the end of the file
    pub max_casts: Option<usize>,

    pub variable: VariableSelection,

    pub depth_slice: DepthSlice,

    /// Fill undeclared depths of legacy standard-level casts from the standard table
    pub backfill_standard_depths: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_casts: None,
            variable: VariableSelection::All,
            depth_slice: DepthSlice::All,
            backfill_standard_depths: true,
        }
    }
}

impl ExportConfig {
    /// Limit the run to `casts` casts; 0 means no limit
    pub fn with_max_casts(mut self, casts: usize) -> Self {
        self.max_casts = (casts > 0).then_some(casts);
        self
    }

    pub fn with_variable(mut self, variable: VariableSelection) -> Self {
        self.variable = variable;
        self
    }

    pub fn with_depth_slice(mut self, slice: DepthSlice) -> Self {
        self.depth_slice = slice;
        self
    }

    pub fn without_backfill(mut self) -> Self {
        self.backfill_standard_depths = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let VariableSelection::Code(code) = self.variable {
            let max = VARIABLE_NAMES.len() as i32;
            if !(1..=max).contains(&code) {
                return Err(WodError::configuration(format!(
                    "variable code {code} is outside 1..={max}"
                )));
            }
        }
        if let DepthSlice::Interval { min, max } = self.depth_slice {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(WodError::configuration(format!(
                    "depth interval [{min}, {max}] is empty"
                )));
            }
        }
        debug!("Export configuration validated: {:?}", self);
        Ok(())
    }
}
