//! Depth resolution for decoded casts.
//!
//! Legacy standard-level casts do not encode a depth per level; the level
//! index selects an entry of the fixed standard-depth table instead.

use crate::constants::LEGACY_STANDARD_DEPTHS;
use crate::reader::Cast;

/// Depth in metres of standard level `level`, if the table reaches that far
pub fn standard_depth(level: usize) -> Option<f64> {
    LEGACY_STANDARD_DEPTHS.get(level).copied()
}

/// Depth of every level of `cast`, in metres.
///
/// Encoded depths are scaled by their right-of-decimal figures and a
/// missing encoded depth stays `None`. Levels without an encoded depth take
/// the standard table entry when `backfill` is set and the cast is not in
/// the newest format.
pub fn resolve_depths(cast: &Cast<'_>, backfill: bool) -> Vec<Option<f64>> {
    let fill = backfill && !cast.record.format.is_newest();
    cast.matrix
        .depths()
        .iter()
        .enumerate()
        .map(|(level, cell)| match cell.depth {
            Some(depth) => depth.to_f64(),
            None if fill => standard_depth(level),
            None => None,
        })
        .collect()
}
