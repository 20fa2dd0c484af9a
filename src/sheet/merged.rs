//! Merged regions, stored across one or more MERGEDCELLS records.
//!
//! Regions are indexed in record order. Removing a region renumbers every
//! later one, so indices must be looked up again after a removal.

use std::ops::{Deref, DerefMut};

use crate::error::{SheetError, SheetResult};
use crate::records::{CellRangeAddress, MAX_ROW, MergedCellsRecord, Record, sid};
use crate::stream::RecordStream;

/// View over the merged regions of one sheet.
pub struct MergedRegionTable<S> {
    stream: S,
}

impl<S> MergedRegionTable<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }
}

fn tables(stream: &RecordStream) -> impl Iterator<Item = &MergedCellsRecord> {
    stream.iter().filter_map(|r| match r {
        Record::MergedCells(table) => Some(table),
        _ => None,
    })
}

impl<S: Deref<Target = RecordStream>> MergedRegionTable<S> {
    pub fn count(&self) -> usize {
        tables(&self.stream).map(|t| t.regions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Region at `index`, absent past the end of the table.
    pub fn get(&self, index: usize) -> Option<CellRangeAddress> {
        tables(&self.stream)
            .flat_map(|t| t.regions.iter())
            .nth(index)
            .copied()
    }

    pub fn regions(&self) -> Vec<CellRangeAddress> {
        tables(&self.stream)
            .flat_map(|t| t.regions.iter().copied())
            .collect()
    }
}

impl<S: DerefMut<Target = RecordStream>> MergedRegionTable<S> {
    /// Append `region` and return its index.
    ///
    /// Overlapping or duplicate regions are accepted.
    pub fn add(&mut self, region: CellRangeAddress) -> SheetResult<usize> {
        region.validate()?;
        let index = self.count();
        let last = self.stream.locate_last(sid::MERGEDCELLS);
        if let Some(position) = last
            && let Some(Record::MergedCells(table)) = self.stream.get_mut(position)
            && !table.is_full()
        {
            table.regions.push(region);
            return Ok(index);
        }
        let record = Record::MergedCells(MergedCellsRecord {
            regions: vec![region],
        });
        match last {
            Some(position) => self.stream.insert_at(position + 1, record)?,
            None => {
                self.stream.insert_ordered(record);
            },
        }
        Ok(index)
    }

    /// Remove the region at `index`; a record left empty is removed too.
    pub fn remove_at(&mut self, index: usize) -> SheetResult<CellRangeAddress> {
        let count = self.count();
        if index >= count {
            return Err(SheetError::out_of_range(
                "merged region",
                index as i64,
                count as i64 - 1,
            ));
        }
        let mut skipped = 0;
        let mut emptied = None;
        let mut removed = None;
        for (position, record) in self.stream.iter_mut().enumerate() {
            let Record::MergedCells(table) = record else {
                continue;
            };
            if index < skipped + table.regions.len() {
                removed = Some(table.regions.remove(index - skipped));
                if table.regions.is_empty() {
                    emptied = Some(position);
                }
                break;
            }
            skipped += table.regions.len();
        }
        if let Some(position) = emptied {
            self.stream.remove_at(position);
        }
        removed.ok_or_else(|| SheetError::missing(sid::MERGEDCELLS))
    }

    /// Translate by `delta` rows every region whose first row is in
    /// `first..=last`, even when it extends past `last`.
    ///
    /// Fails without changing anything if a translated region would leave
    /// the sheet. Returns the number of regions moved.
    pub fn shift_for_row_move(&mut self, first: u32, last: u32, delta: i32) -> SheetResult<usize> {
        let moves = |first_row: u32| first <= first_row && first_row <= last;
        for region in self.regions().iter().filter(|r| moves(r.first_row)) {
            for row in [region.first_row, region.last_row] {
                let target = row as i64 + delta as i64;
                if target < 0 || target > MAX_ROW as i64 {
                    return Err(SheetError::out_of_range("row", target, MAX_ROW));
                }
            }
        }
        let mut moved = 0;
        for record in self.stream.iter_mut() {
            let Record::MergedCells(table) = record else {
                continue;
            };
            for region in table.regions.iter_mut().filter(|r| moves(r.first_row)) {
                region.first_row = (region.first_row as i64 + delta as i64) as u32;
                region.last_row = (region.last_row as i64 + delta as i64) as u32;
                moved += 1;
            }
        }
        Ok(moved)
    }
}
