//! COLINFO records and the default column width.
//!
//! A COLINFO record covers a run of columns. Editing one column splits the
//! run so the edited column gets a record of its own.

use crate::error::{SheetError, SheetResult};
use crate::records::{ColumnInfoRecord, MAX_COLUMN, Record, sid};
use crate::stream::{RecordStream, find_record};

/// Widest column Excel accepts, in 1/256 of a character.
pub const MAX_COLUMN_WIDTH: u16 = 255 * 256;

pub(crate) fn check_column(col: u32) -> SheetResult<u16> {
    if col > MAX_COLUMN as u32 {
        return Err(SheetError::out_of_range("column", col, MAX_COLUMN));
    }
    Ok(col as u16)
}

pub(crate) fn column_infos(stream: &RecordStream) -> impl Iterator<Item = &ColumnInfoRecord> {
    stream.iter().filter_map(|r| match r {
        Record::ColumnInfo(info) => Some(info),
        _ => None,
    })
}

pub(crate) fn column_info(stream: &RecordStream, col: u16) -> Option<&ColumnInfoRecord> {
    column_infos(stream).find(|info| info.contains(col))
}

pub(crate) fn default_column_width(stream: &RecordStream) -> SheetResult<u16> {
    find_record!(stream, DefColWidth)
        .copied()
        .ok_or_else(|| SheetError::missing(sid::DEFCOLWIDTH))
}

/// Width of `col` in 1/256 of a character.
pub(crate) fn column_width(stream: &RecordStream, col: u16) -> SheetResult<u16> {
    match column_info(stream, col) {
        Some(info) => Ok(info.width),
        None => Ok(default_column_width(stream)?.saturating_mul(256)),
    }
}

/// Index of a COLINFO record covering exactly `col`, splitting or creating
/// records as needed.
pub(crate) fn isolate_column(stream: &mut RecordStream, col: u16) -> SheetResult<usize> {
    let existing = stream
        .iter()
        .position(|r| matches!(r, Record::ColumnInfo(info) if info.contains(col)));

    let Some(index) = existing else {
        let width = default_column_width(stream)?.saturating_mul(256);
        let position = stream
            .iter()
            .position(|r| matches!(r, Record::ColumnInfo(info) if info.first_col > col))
            .or_else(|| stream.locate_last(sid::COLINFO).map(|i| i + 1))
            .unwrap_or_else(|| stream.position_for(sid::COLINFO));
        stream.insert_at(position, Record::ColumnInfo(ColumnInfoRecord::new(col, col, width)))?;
        return Ok(position);
    };

    let Some(Record::ColumnInfo(info)) = stream.get(index) else {
        return Err(SheetError::missing(sid::COLINFO));
    };
    let info = info.clone();
    if info.first_col == col && info.last_col == col {
        return Ok(index);
    }

    let mut parts = Vec::with_capacity(3);
    if info.first_col < col {
        parts.push(ColumnInfoRecord {
            last_col: col - 1,
            ..info.clone()
        });
    }
    let target = parts.len();
    parts.push(ColumnInfoRecord {
        first_col: col,
        last_col: col,
        ..info.clone()
    });
    if col < info.last_col {
        parts.push(ColumnInfoRecord {
            first_col: col + 1,
            ..info
        });
    }

    stream.remove_at(index);
    for (offset, part) in parts.into_iter().enumerate() {
        stream.insert_at(index + offset, Record::ColumnInfo(part))?;
    }
    Ok(index + target)
}

pub(crate) fn column_info_mut(
    stream: &mut RecordStream,
    col: u16,
) -> SheetResult<&mut ColumnInfoRecord> {
    let index = isolate_column(stream, col)?;
    match stream.get_mut(index) {
        Some(Record::ColumnInfo(info)) => Ok(info),
        _ => Err(SheetError::missing(sid::COLINFO)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, DimensionsRecord};

    fn stream() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::DefColWidth(8),
            Record::Dimensions(DimensionsRecord::default()),
            Record::Eof,
        ])
    }

    fn runs(stream: &RecordStream) -> Vec<(u16, u16, u16)> {
        column_infos(stream)
            .map(|i| (i.first_col, i.last_col, i.width))
            .collect()
    }

    #[test]
    fn test_width_falls_back_to_default() {
        let records = stream();
        assert_eq!(column_width(&records, 40).unwrap(), 8 * 256);
    }

    #[test]
    fn test_split_run() {
        let mut records = stream();
        records
            .insert_at(2, Record::ColumnInfo(ColumnInfoRecord::new(2, 6, 1000)))
            .unwrap();
        column_info_mut(&mut records, 4).unwrap().width = 3000;
        assert_eq!(runs(&records), vec![(2, 3, 1000), (4, 4, 3000), (5, 6, 1000)]);
        column_info_mut(&mut records, 2).unwrap().width = 1500;
        assert_eq!(
            runs(&records),
            vec![(2, 2, 1500), (3, 3, 1000), (4, 4, 3000), (5, 6, 1000)]
        );
        assert_eq!(column_width(&records, 6).unwrap(), 1000);
    }

    #[test]
    fn test_new_columns_are_ordered() {
        let mut records = stream();
        column_info_mut(&mut records, 9).unwrap();
        column_info_mut(&mut records, 1).unwrap();
        column_info_mut(&mut records, 5).unwrap();
        let firsts: Vec<u16> = runs(&records).iter().map(|r| r.0).collect();
        assert_eq!(firsts, vec![1, 5, 9]);
        assert_eq!(records.locate_first(sid::COLINFO), Some(2));
    }

    #[test]
    fn test_column_bounds() {
        assert!(check_column(255).is_ok());
        assert!(check_column(256).is_err());
    }
}
