//! Decoders for the repeated, count-prefixed blocks of a cast.
//!
//! Each block is positional: a byte or item count followed by that many
//! fixed-shape entries. Nothing in the stream names the block, so the
//! caller must invoke these in grammar order.

use std::io::BufRead;

use tracing::trace;

use crate::constants::{info_types, sentinels, widths};
use crate::error::Result;
use crate::field::{FieldDecoder, TextLength};
use crate::models::{
    CharacterBlock, DepthLevel, HeaderEntry, Investigator, Measurement, TaxonEntry,
    VariableDescriptor, VariableSecondaryHeader,
};
use crate::store::{Axis, GrowableStore};

/// Right-of-decimal figures assigned to measurements written with zero digits
const ZERO_WIDTH_RIGHT_FIGURES: u8 = 2;

/// Block-level decoding on top of a [`FieldDecoder`]
pub struct BlockDecoder<'d, R> {
    fields: &'d mut FieldDecoder<R>,
}

impl<'d, R: BufRead> BlockDecoder<'d, R> {
    pub fn new(fields: &'d mut FieldDecoder<R>) -> Self {
        Self { fields }
    }

    /// `nparm` variable descriptors with their variable-specific secondary headers
    pub fn variables(&mut self, nparm: usize, out: &mut Vec<VariableDescriptor>) -> Result<()> {
        out.reserve(nparm);
        for _ in 0..nparm {
            let code = self.fields.internal()?;
            let error_flag = self.fields.flag()?;
            let count = self.fields.count("variable secondary header count")?;
            let mut secondary_headers = Vec::with_capacity(count);
            for _ in 0..count {
                let code = self.fields.internal()?;
                let value = self.fields.measured(sentinels::MISSING)?;
                secondary_headers.push(VariableSecondaryHeader { code, value });
            }
            trace!(
                "Variable {} with {} secondary headers",
                code,
                secondary_headers.len()
            );
            out.push(VariableDescriptor {
                code,
                error_flag,
                secondary_headers,
            });
        }
        Ok(())
    }

    /// Originator codes and primary investigators
    pub fn character_block(&mut self) -> Result<CharacterBlock> {
        let mut block = CharacterBlock::default();
        let byte_count = self.fields.internal()?;
        if byte_count <= 0 {
            return Ok(block);
        }

        let entries = self.fields.fixed_count(widths::INFO_COUNT, "character entry count")?;
        for _ in 0..entries {
            match self.fields.fixed(widths::INFO_TYPE)? {
                info_types::ORIGINATOR_CRUISE => {
                    block.originator_cruise = Some(self.length_prefixed_text()?);
                }
                info_types::ORIGINATOR_STATION => {
                    block.originator_station = Some(self.length_prefixed_text()?);
                }
                info_types::INVESTIGATORS => {
                    let count = self
                        .fields
                        .fixed_count(widths::INVESTIGATOR_COUNT, "investigator count")?;
                    block.investigators.clear();
                    block.investigators.reserve(count);
                    for _ in 0..count {
                        let variable_code = self.fields.internal()?;
                        let investigator_code = self.fields.internal()?;
                        block.investigators.push(Investigator {
                            variable_code,
                            investigator_code,
                        });
                    }
                }
                other => {
                    return Err(self
                        .fields
                        .malformed(format!("unknown character entry type {other}")));
                }
            }
        }
        Ok(block)
    }

    /// Cast-level secondary headers
    pub fn secondary_headers(&mut self, out: &mut Vec<HeaderEntry>) -> Result<()> {
        let byte_count = self.fields.internal()?;
        if byte_count <= 0 {
            return Ok(());
        }
        let count = self.fields.count("secondary header count")?;
        self.header_entries(count, out)
    }

    /// Biological headers followed by taxa sets; returns the number of taxa sets
    pub fn biology(
        &mut self,
        store: &mut GrowableStore,
        headers: &mut Vec<HeaderEntry>,
    ) -> Result<usize> {
        let byte_count = self.fields.internal()?;
        if byte_count <= 0 {
            return Ok(0);
        }
        let count = self.fields.count("biological header count")?;
        self.header_entries(count, headers)?;

        let sets = self.fields.count("taxa set count")?;
        if sets == 0 {
            return Ok(0);
        }
        store.ensure_capacity(Axis::TaxaSets, sets)?;

        let slots = store.slots_per_set();
        for set in 0..sets {
            let entries = self.fields.count("taxa entry count")?;
            if entries > slots {
                return Err(self.fields.malformed(format!(
                    "taxa set {} declares {entries} entries, limit is {slots}",
                    set + 1
                )));
            }
            store.set_taxa_count(set, entries);
            for entry in 0..entries {
                let taxon_code = self.fields.internal()?;
                let value = self.fields.measured(sentinels::MISSING)?;
                let error_flag = self.fields.flag()?;
                let originator_flag = self.fields.flag()?;
                *store.taxon_mut(set, entry) = TaxonEntry {
                    taxon_code,
                    value,
                    error_flag,
                    originator_flag,
                };
            }
        }
        Ok(sets)
    }

    /// Depth column and `nparm x levels` measurements.
    ///
    /// When `depth_encoded` is false the depth cells are reset to "not
    /// encoded" and only measurements are read.
    pub fn level_matrix(
        &mut self,
        store: &mut GrowableStore,
        levels: usize,
        nparm: usize,
        depth_encoded: bool,
    ) -> Result<()> {
        let cells = nparm
            .checked_mul(levels)
            .ok_or_else(|| self.fields.malformed("variable-level cell count overflows"))?;
        store.ensure_capacity(Axis::Depth, levels)?;
        store.ensure_capacity(Axis::Measurement, cells)?;

        for level in 0..levels {
            *store.depth_mut(level) = if depth_encoded {
                let depth = self.fields.measured(sentinels::MISSING)?;
                let error_flag = self.fields.flag()?;
                let originator_flag = self.fields.flag()?;
                DepthLevel {
                    depth: Some(depth),
                    error_flag,
                    originator_flag,
                }
            } else {
                DepthLevel::default()
            };

            for variable in 0..nparm {
                let mut value = self.fields.measured(sentinels::MISSING)?;
                let (error_flag, originator_flag) = if value.total_figures > 0 {
                    (self.fields.flag()?, self.fields.flag()?)
                } else {
                    if !value.is_missing {
                        value.right_of_decimal_figures = ZERO_WIDTH_RIGHT_FIGURES;
                    }
                    (0, 0)
                };
                *store.cell_mut(levels, variable, level) = Measurement {
                    value,
                    error_flag,
                    originator_flag,
                };
            }
        }
        Ok(())
    }

    fn header_entries(&mut self, count: usize, out: &mut Vec<HeaderEntry>) -> Result<()> {
        out.reserve(count);
        for _ in 0..count {
            let code = self.fields.internal()?;
            let value = self.fields.measured(sentinels::MISSING)?;
            out.push(HeaderEntry { code, value });
        }
        Ok(())
    }

    fn length_prefixed_text(&mut self) -> Result<String> {
        let len = self
            .fields
            .fixed_count(widths::TEXT_LENGTH, "originator code length")?;
        self.fields.decode_text(TextLength::Known(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderConfig;
    use crate::error::WodError;
    use std::io::Cursor;

    fn decoder(bytes: &str) -> FieldDecoder<Cursor<Vec<u8>>> {
        FieldDecoder::new(Cursor::new(bytes.as_bytes().to_vec()))
    }

    fn store() -> GrowableStore {
        GrowableStore::new(&ReaderConfig::default()).unwrap()
    }

    #[test]
    fn test_variables_with_secondary_headers() {
        // code 1, flag 0, one header (code 5, value 2.5); code 2, flag 1, none
        let mut fields = decoder(concat!("110", "11", "15", "22125", "12", "1", "10"));
        let mut out = Vec::new();
        BlockDecoder::new(&mut fields).variables(2, &mut out).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].code, 1);
        assert_eq!(out[0].error_flag, 0);
        assert_eq!(out[0].secondary_headers.len(), 1);
        assert_eq!(out[0].secondary_headers[0].code, 5);
        assert_eq!(out[0].secondary_headers[0].value.to_f64(), Some(2.5));
        assert_eq!(out[1].code, 2);
        assert_eq!(out[1].error_flag, 1);
        assert!(out[1].secondary_headers.is_empty());
    }

    #[test]
    fn test_character_block_absent() {
        let mut fields = decoder("10");
        let block = BlockDecoder::new(&mut fields).character_block().unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn test_character_block_entries() {
        // byte count 30, 3 entries: cruise "AB12", station "S7", one investigator 1 -> 215
        let input = concat!(
            "230", "3", "1", "04", "AB12", "2", "02", "S7", "3", "01", "11", "3215"
        );
        let mut fields = decoder(input);
        let block = BlockDecoder::new(&mut fields).character_block().unwrap();
        assert_eq!(block.originator_cruise.as_deref(), Some("AB12"));
        assert_eq!(block.originator_station.as_deref(), Some("S7"));
        assert_eq!(
            block.investigators,
            vec![Investigator {
                variable_code: 1,
                investigator_code: 215
            }]
        );
    }

    #[test]
    fn test_character_block_unknown_type_is_malformed() {
        let mut fields = decoder(concat!("15", "1", "7"));
        let result = BlockDecoder::new(&mut fields).character_block();
        assert!(matches!(result, Err(WodError::MalformedRecord { .. })));
    }

    #[test]
    fn test_secondary_headers() {
        // byte count 12, two headers: 1 -> 42, 29 -> missing
        let mut fields = decoder(concat!("212", "12", "11", "22042", "229", "-"));
        let mut out = Vec::new();
        BlockDecoder::new(&mut fields)
            .secondary_headers(&mut out)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].code, 1);
        assert_eq!(out[0].value.value, 42);
        assert_eq!(out[1].code, 29);
        assert!(out[1].value.is_missing);
    }

    #[test]
    fn test_biology_without_taxa_does_not_grow() {
        let mut store = store();
        // byte count 9, one header (3 -> 7), zero taxa sets
        let mut fields = decoder(concat!("19", "11", "13", "1107", "10"));
        let mut headers = Vec::new();
        let sets = BlockDecoder::new(&mut fields)
            .biology(&mut store, &mut headers)
            .unwrap();
        assert_eq!(sets, 0);
        assert_eq!(headers.len(), 1);
        assert_eq!(store.growth_events(), 0);
        assert!(store.taxa_sets(sets).is_empty());
    }

    #[test]
    fn test_biology_with_taxa_sets_grows_store() {
        let mut store = store();
        // each entry: code 1, value 5, error flag 0, originator flag 1
        let input = concat!(
            "240", "10", "12", "11", "11110501", "12", "11110501", "11110501"
        );
        let mut fields = decoder(input);
        let mut headers = Vec::new();
        let sets = BlockDecoder::new(&mut fields)
            .biology(&mut store, &mut headers)
            .unwrap();
        assert_eq!(sets, 2);
        assert_eq!(store.growth_events(), 1);
        let taxa = store.taxa_sets(sets);
        assert_eq!(taxa.get(0).unwrap().len(), 1);
        assert_eq!(taxa.get(1).unwrap().len(), 2);
        let second = taxa.get(1).unwrap()[1];
        assert_eq!(second.taxon_code, 1);
        assert_eq!(second.value.value, 5);
        assert_eq!(second.error_flag, 0);
        assert_eq!(second.originator_flag, 1);
    }

    #[test]
    fn test_taxa_set_over_slot_limit_is_malformed() {
        let config = ReaderConfig::default().with_taxa_slots_per_set(1);
        let mut store = GrowableStore::new(&config).unwrap();
        let mut fields = decoder(concat!("240", "10", "11", "12"));
        let mut headers = Vec::new();
        let result = BlockDecoder::new(&mut fields).biology(&mut store, &mut headers);
        assert!(matches!(result, Err(WodError::MalformedRecord { .. })));
    }

    #[test]
    fn test_level_matrix_zero_width_measurement_convention() {
        let mut store = store();
        // one level: depth 0 [0,0]; variable value written with zero digits
        let mut fields = decoder(concat!("110000", "100"));
        BlockDecoder::new(&mut fields)
            .level_matrix(&mut store, 1, 1, true)
            .unwrap();
        let matrix = store.level_matrix(1, 1);
        let cell = matrix.measurement(0, 0).unwrap();
        assert!(!cell.value.is_missing);
        assert_eq!(cell.value.total_figures, 0);
        assert_eq!(cell.value.right_of_decimal_figures, 2);
        assert_eq!((cell.error_flag, cell.originator_flag), (0, 0));
    }

    #[test]
    fn test_level_matrix_missing_measurement_keeps_zeroed_figures() {
        let mut store = store();
        let mut fields = decoder(concat!("110000", "-"));
        BlockDecoder::new(&mut fields)
            .level_matrix(&mut store, 1, 1, true)
            .unwrap();
        let cell = *store.level_matrix(1, 1).measurement(0, 0).unwrap();
        assert!(cell.value.is_missing);
        assert_eq!(cell.value.value, -9999);
        assert_eq!(cell.value.right_of_decimal_figures, 0);
    }

    #[test]
    fn test_level_matrix_without_encoded_depth() {
        let mut store = store();
        // two levels, one variable, measurements only
        let mut fields = decoder(concat!("2213500", "2214010"));
        BlockDecoder::new(&mut fields)
            .level_matrix(&mut store, 2, 1, false)
            .unwrap();
        let matrix = store.level_matrix(2, 1);
        assert!(matrix.depths().iter().all(|d| d.depth.is_none()));
        let values: Vec<i32> = matrix
            .variable(0)
            .unwrap()
            .iter()
            .map(|m| m.value.value)
            .collect();
        assert_eq!(values, vec![35, 40]);
        assert_eq!(matrix.measurement(0, 1).unwrap().error_flag, 1);
    }

    #[test]
    fn test_level_matrix_grows_once_for_larger_cast() {
        let mut store = store();
        let levels = 70;
        let nparm = 2;
        let input = concat!("110000", "110000", "110000").repeat(levels);
        let mut fields = decoder(&input);
        BlockDecoder::new(&mut fields)
            .level_matrix(&mut store, levels, nparm, true)
            .unwrap();
        assert_eq!(store.growth_events(), 1);
        assert_eq!(store.capacity_of(Axis::Measurement), 140);
        assert_eq!(store.capacity_of(Axis::Depth), 137);
    }
}
