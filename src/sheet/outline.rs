//! Row and column outline grouping.
//!
//! Outline levels live on the individual ROW and COLINFO records. The GUTS
//! record mirrors the deepest level so Excel can size the outline gutter; it
//! is recomputed after every grouping change and created when missing.

use std::ops::{Deref, DerefMut};

use crate::error::{SheetError, SheetResult};
use crate::records::{GutsRecord, MAX_OUTLINE_LEVEL, Record, sid};
use crate::stream::{RecordStream, find_record};

use super::{columns, rows};

/// View over the outline state of one sheet.
pub struct Outline<S> {
    stream: S,
}

impl<S> Outline<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }
}

fn check_span(first: u32, last: u32) -> SheetResult<()> {
    if first > last {
        return Err(SheetError::InvalidArgument(format!(
            "first index {} is after last index {}",
            first, last
        )));
    }
    Ok(())
}

impl<S: Deref<Target = RecordStream>> Outline<S> {
    pub fn guts(&self) -> Option<&GutsRecord> {
        find_record!(self.stream, Guts)
    }

    /// Outline level of `row`; rows without a record are at level 0.
    pub fn row_level(&self, row: u32) -> u8 {
        u16::try_from(row)
            .ok()
            .and_then(|row| rows::find_row(&self.stream, row))
            .map_or(0, |r| r.outline_level())
    }

    pub fn column_level(&self, col: u32) -> u8 {
        u16::try_from(col)
            .ok()
            .and_then(|col| columns::column_info(&self.stream, col))
            .map_or(0, |c| c.outline_level())
    }

    pub fn max_row_level(&self) -> u8 {
        rows::rows(&self.stream)
            .map(|r| r.outline_level())
            .max()
            .unwrap_or(0)
    }

    pub fn max_column_level(&self) -> u8 {
        columns::column_infos(&self.stream)
            .map(|c| c.outline_level())
            .max()
            .unwrap_or(0)
    }
}

impl<S: DerefMut<Target = RecordStream>> Outline<S> {
    /// Raise the outline level of every row in `first..=last` by one.
    ///
    /// Rows without a record get one. Levels stop at 7.
    pub fn group_rows(&mut self, first: u32, last: u32) -> SheetResult<()> {
        check_span(first, last)?;
        let first = rows::check_row(first)?;
        let last = rows::check_row(last)?;
        self.stream.require(sid::DIMENSIONS)?;
        for row in first..=last {
            rows::ensure_row(&mut self.stream, row)?;
            if let Some(record) = rows::find_row_mut(&mut self.stream, row) {
                record.set_outline_level(record.outline_level().saturating_add(1));
            }
        }
        self.update_guts();
        Ok(())
    }

    /// Lower the outline level of every existing row in `first..=last` by one.
    pub fn ungroup_rows(&mut self, first: u32, last: u32) -> SheetResult<()> {
        check_span(first, last)?;
        let first = rows::check_row(first)?;
        let last = rows::check_row(last)?;
        for record in self.stream.iter_mut() {
            if let Record::Row(row) = record
                && first <= row.row
                && row.row <= last
            {
                row.set_outline_level(row.outline_level().saturating_sub(1));
            }
        }
        self.update_guts();
        Ok(())
    }

    pub fn group_columns(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.adjust_columns(first, last, |level| (level + 1).min(MAX_OUTLINE_LEVEL))
    }

    pub fn ungroup_columns(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.adjust_columns(first, last, |level| level.saturating_sub(1))
    }

    fn adjust_columns(&mut self, first: u32, last: u32, step: fn(u8) -> u8) -> SheetResult<()> {
        check_span(first, last)?;
        let first = columns::check_column(first)?;
        let last = columns::check_column(last)?;
        columns::default_column_width(&self.stream)?;
        for col in first..=last {
            let info = columns::column_info_mut(&mut self.stream, col)?;
            info.set_outline_level(step(info.outline_level()));
        }
        self.update_guts();
        Ok(())
    }

    /// Recompute GUTS from the deepest row and column levels.
    fn update_guts(&mut self) {
        let (row_gutter, row_levels) = GutsRecord::gutter_for(self.max_row_level());
        let (col_gutter, col_levels) = GutsRecord::gutter_for(self.max_column_level());
        let record = self
            .stream
            .get_or_insert_with(sid::GUTS, || Record::Guts(GutsRecord::default()));
        if let Record::Guts(guts) = record {
            guts.left_row_gutter = row_gutter;
            guts.row_level_max = row_levels;
            guts.top_col_gutter = col_gutter;
            guts.col_level_max = col_levels;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, DimensionsRecord, Flag, WsBoolFlags};

    fn stream_without_guts() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::Gridset(Flag::ON),
            Record::WsBool(WsBoolFlags::default()),
            Record::DefColWidth(8),
            Record::Dimensions(DimensionsRecord::default()),
            Record::Eof,
        ])
    }

    #[test]
    fn test_group_rows_creates_guts() {
        let mut records = stream_without_guts();
        let mut outline = Outline::new(&mut records);
        assert!(outline.guts().is_none());
        outline.group_rows(0, 2).unwrap();
        outline.group_rows(1, 1).unwrap();
        assert_eq!(outline.row_level(0), 1);
        assert_eq!(outline.row_level(1), 2);
        assert_eq!(outline.row_level(3), 0);
        let guts = *outline.guts().unwrap();
        assert_eq!(guts.row_level_max, 3);
        assert_eq!(guts.left_row_gutter, 29 + 12 * 2);
        assert_eq!(guts.col_level_max, 0);
        assert_eq!(records.locate_first(sid::GUTS), Some(2));
    }

    #[test]
    fn test_ungroup_floors_at_zero() {
        let mut records = stream_without_guts();
        let mut outline = Outline::new(&mut records);
        outline.group_rows(4, 5).unwrap();
        outline.ungroup_rows(0, 10).unwrap();
        outline.ungroup_rows(0, 10).unwrap();
        assert_eq!(outline.row_level(4), 0);
        assert_eq!(outline.guts().unwrap().row_level_max, 0);
        assert_eq!(outline.guts().unwrap().left_row_gutter, 0);
    }

    #[test]
    fn test_levels_saturate() {
        let mut records = stream_without_guts();
        let mut outline = Outline::new(&mut records);
        for _ in 0..9 {
            outline.group_rows(0, 0).unwrap();
        }
        assert_eq!(outline.row_level(0), MAX_OUTLINE_LEVEL);
    }

    #[test]
    fn test_group_columns() {
        let mut records = stream_without_guts();
        let mut outline = Outline::new(&mut records);
        outline.group_columns(2, 3).unwrap();
        assert_eq!(outline.column_level(2), 1);
        assert_eq!(outline.column_level(4), 0);
        assert_eq!(outline.guts().unwrap().col_level_max, 2);
        outline.ungroup_columns(2, 3).unwrap();
        assert_eq!(outline.max_column_level(), 0);
    }

    #[test]
    fn test_bad_span() {
        let mut records = stream_without_guts();
        let mut outline = Outline::new(&mut records);
        assert!(outline.group_rows(5, 2).is_err());
        assert!(outline.group_rows(0, 70000).is_err());
        assert!(outline.guts().is_none());
    }
}
