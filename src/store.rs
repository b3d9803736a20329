//! Session-owned buffers for the variable-size parts of a cast.
//!
//! Depth levels, the variable-by-level measurement matrix and the taxa
//! sets are written into buffers that only ever grow. Capacity tracks
//! the largest cast seen so far in the session, so casts that fluctuate
//! below that peak reuse the same allocation.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::error::{Result, WodError};
use crate::models::{DepthLevel, Measurement, TaxonEntry};

/// Independently sized buffer groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    /// Unit: one taxa set of `slots_per_set` entries
    TaxaSets,
    /// Unit: one depth level
    Depth,
    /// Unit: one variable-level cell
    Measurement,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::TaxaSets => "taxa set",
            Axis::Depth => "depth",
            Axis::Measurement => "measurement",
        };
        f.write_str(name)
    }
}

/// Current capacity of every axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub taxa_sets: usize,
    pub levels: usize,
    pub cells: usize,
}

/// Growable buffers reused from cast to cast
#[derive(Debug)]
pub struct GrowableStore {
    slots_per_set: usize,
    capacity: Capacity,
    depth: Vec<DepthLevel>,
    cells: Vec<Measurement>,
    taxa_counts: Vec<usize>,
    taxa: Vec<TaxonEntry>,
    growth_events: usize,
}

impl GrowableStore {
    /// Store pre-seeded with the configured initial capacities
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        let mut store = Self {
            slots_per_set: config.taxa_slots_per_set,
            capacity: Capacity {
                taxa_sets: 0,
                levels: 0,
                cells: 0,
            },
            depth: Vec::new(),
            cells: Vec::new(),
            taxa_counts: Vec::new(),
            taxa: Vec::new(),
            growth_events: 0,
        };
        store.grow(Axis::TaxaSets, config.initial_taxa_sets)?;
        store.grow(Axis::Depth, config.initial_levels)?;
        store.grow(Axis::Measurement, config.initial_cells)?;
        Ok(store)
    }

    /// Grow `axis` to hold at least `new_minimum` units.
    ///
    /// Requests at or below the current capacity are no-ops. Returns whether
    /// the buffers were reallocated.
    pub fn ensure_capacity(&mut self, axis: Axis, new_minimum: usize) -> Result<bool> {
        if new_minimum <= self.capacity_of(axis) {
            return Ok(false);
        }
        let previous = self.capacity_of(axis);
        self.grow(axis, new_minimum)?;
        self.growth_events += 1;
        debug!(
            "Grew {} buffers from {} to {} entries",
            axis, previous, new_minimum
        );
        Ok(true)
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn capacity_of(&self, axis: Axis) -> usize {
        match axis {
            Axis::TaxaSets => self.capacity.taxa_sets,
            Axis::Depth => self.capacity.levels,
            Axis::Measurement => self.capacity.cells,
        }
    }

    /// Reallocations performed after the initial seeding
    pub fn growth_events(&self) -> usize {
        self.growth_events
    }

    pub fn slots_per_set(&self) -> usize {
        self.slots_per_set
    }

    /// Matrix view over the first `levels` depths and `nparm * levels` cells
    pub fn level_matrix(&self, levels: usize, nparm: usize) -> LevelMatrix<'_> {
        let cells = nparm.saturating_mul(levels).min(self.cells.len());
        LevelMatrix {
            levels: levels.min(self.depth.len()),
            nparm,
            depth: &self.depth[..levels.min(self.depth.len())],
            cells: &self.cells[..cells],
        }
    }

    /// View over the first `count` taxa sets
    pub fn taxa_sets(&self, count: usize) -> TaxaSets<'_> {
        TaxaSets {
            counts: &self.taxa_counts[..count.min(self.taxa_counts.len())],
            slots: &self.taxa,
            slots_per_set: self.slots_per_set,
        }
    }

    pub(crate) fn depth_mut(&mut self, level: usize) -> &mut DepthLevel {
        &mut self.depth[level]
    }

    /// Cell of variable `variable` at `level`; levels of one variable are contiguous
    pub(crate) fn cell_mut(
        &mut self,
        levels: usize,
        variable: usize,
        level: usize,
    ) -> &mut Measurement {
        &mut self.cells[variable * levels + level]
    }

    pub(crate) fn set_taxa_count(&mut self, set: usize, count: usize) {
        self.taxa_counts[set] = count;
    }

    pub(crate) fn taxon_mut(&mut self, set: usize, entry: usize) -> &mut TaxonEntry {
        &mut self.taxa[set * self.slots_per_set + entry]
    }

    fn grow(&mut self, axis: Axis, units: usize) -> Result<()> {
        match axis {
            Axis::TaxaSets => {
                let slots = units.checked_mul(self.slots_per_set).ok_or(WodError::Allocation {
                    axis,
                    requested: units,
                })?;
                resize(&mut self.taxa_counts, units, axis)?;
                resize(&mut self.taxa, slots, axis)?;
                self.capacity.taxa_sets = units;
            }
            Axis::Depth => {
                resize(&mut self.depth, units, axis)?;
                self.capacity.levels = units;
            }
            Axis::Measurement => {
                resize(&mut self.cells, units, axis)?;
                self.capacity.cells = units;
            }
        }
        Ok(())
    }
}

fn resize<T: Default + Clone>(buffer: &mut Vec<T>, len: usize, axis: Axis) -> Result<()> {
    if len > buffer.len() {
        buffer
            .try_reserve_exact(len - buffer.len())
            .map_err(|_| WodError::Allocation {
                axis,
                requested: len,
            })?;
        buffer.resize(len, T::default());
    }
    Ok(())
}

/// Depth levels and per-variable measurements of one cast
#[derive(Debug, Clone, Copy)]
pub struct LevelMatrix<'a> {
    levels: usize,
    nparm: usize,
    depth: &'a [DepthLevel],
    cells: &'a [Measurement],
}

impl<'a> LevelMatrix<'a> {
    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn variable_count(&self) -> usize {
        self.nparm
    }

    pub fn depths(&self) -> &'a [DepthLevel] {
        self.depth
    }

    pub fn depth(&self, level: usize) -> Option<&'a DepthLevel> {
        self.depth.get(level)
    }

    /// All levels of one variable
    pub fn variable(&self, index: usize) -> Option<&'a [Measurement]> {
        if index >= self.nparm {
            return None;
        }
        let start = index * self.levels;
        self.cells.get(start..start + self.levels)
    }

    pub fn measurement(&self, variable: usize, level: usize) -> Option<&'a Measurement> {
        if level >= self.levels {
            return None;
        }
        self.variable(variable).and_then(|column| column.get(level))
    }
}

/// Taxa sets of one cast
#[derive(Debug, Clone, Copy)]
pub struct TaxaSets<'a> {
    counts: &'a [usize],
    slots: &'a [TaxonEntry],
    slots_per_set: usize,
}

impl<'a> TaxaSets<'a> {
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, set: usize) -> Option<&'a [TaxonEntry]> {
        let count = *self.counts.get(set)?;
        let start = set * self.slots_per_set;
        self.slots.get(start..start + count)
    }

    /// Entries of every set, in order
    pub fn sets(self) -> impl Iterator<Item = &'a [TaxonEntry]> {
        (0..self.counts.len()).filter_map(move |set| self.get(set))
    }
}
