//! Output sinks for decoded casts.
//!
//! A session hands every cast it reads to a [`CastSink`]. Two text sinks
//! are provided: a human-readable dump of every block and a CSV depth
//! matrix with one row per selected level.

pub mod csv;
pub mod dump;

pub use csv::CsvRenderer;
pub use dump::DumpRenderer;

use crate::constants::MAX_RENDER_PRECISION;
use crate::error::Result;
use crate::models::Field;
use crate::reader::Cast;

/// Receives casts in stream order
pub trait CastSink {
    /// Called once before the first cast
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render one cast; `index` is 1-based. Returns whether anything was written.
    fn write_cast(&mut self, index: usize, cast: &Cast<'_>) -> Result<bool>;

    /// Called once after the last cast
    fn finish(&mut self) -> Result<()>;
}

/// Decimal places used to print `field`, capped at [`MAX_RENDER_PRECISION`]
pub(crate) fn render_precision(field: &Field) -> usize {
    usize::from(field.right_of_decimal_figures.min(MAX_RENDER_PRECISION))
}
