//! ROW record block.
//!
//! ROW records sit together after DIMENSIONS (and any COLINFO) in ascending
//! row order. These helpers keep that order and the DIMENSIONS range in step.

use crate::error::{SheetError, SheetResult};
use crate::records::{MAX_ROW, Record, RowRecord, sid};
use crate::stream::{RecordStream, find_record_mut};

pub(crate) fn check_row(row: u32) -> SheetResult<u16> {
    if row > MAX_ROW {
        return Err(SheetError::out_of_range("row", row, MAX_ROW));
    }
    Ok(row as u16)
}

pub(crate) fn rows(stream: &RecordStream) -> impl Iterator<Item = &RowRecord> {
    stream.iter().filter_map(|r| match r {
        Record::Row(row) => Some(row),
        _ => None,
    })
}

pub(crate) fn row_position(stream: &RecordStream, row: u16) -> Option<usize> {
    stream
        .iter()
        .position(|r| matches!(r, Record::Row(existing) if existing.row == row))
}

pub(crate) fn find_row(stream: &RecordStream, row: u16) -> Option<&RowRecord> {
    rows(stream).find(|r| r.row == row)
}

pub(crate) fn find_row_mut(stream: &mut RecordStream, row: u16) -> Option<&mut RowRecord> {
    stream.iter_mut().find_map(|r| match r {
        Record::Row(existing) if existing.row == row => Some(existing),
        _ => None,
    })
}

/// Index of the ROW record for `row`, creating it when absent.
pub(crate) fn ensure_row(stream: &mut RecordStream, row: u16) -> SheetResult<usize> {
    if let Some(index) = row_position(stream, row) {
        return Ok(index);
    }
    stream.require(sid::DIMENSIONS)?;

    let position = stream
        .iter()
        .position(|r| matches!(r, Record::Row(existing) if existing.row > row))
        .or_else(|| stream.locate_last(sid::ROW).map(|i| i + 1))
        .unwrap_or_else(|| stream.position_for(sid::ROW));
    stream.insert_at(position, Record::Row(RowRecord::new(row)))?;
    if let Some(dims) = find_record_mut!(stream, Dimensions) {
        dims.include_row(row as u32);
    }
    Ok(position)
}

pub(crate) fn remove_row(stream: &mut RecordStream, row: u16) -> bool {
    match row_position(stream, row) {
        Some(index) => stream.remove_at(index).is_some(),
        None => false,
    }
}

/// Restore ascending row order inside the slots currently held by ROW records.
fn sort_row_block(stream: &mut RecordStream) {
    let slots: Vec<usize> = stream
        .iter()
        .enumerate()
        .filter(|(_, r)| r.sid() == sid::ROW)
        .map(|(i, _)| i)
        .collect();
    let mut sorted: Vec<RowRecord> = rows(stream).cloned().collect();
    sorted.sort_by_key(|r| r.row);
    for (slot, row) in slots.into_iter().zip(sorted) {
        if let Some(record) = stream.get_mut(slot) {
            *record = Record::Row(row);
        }
    }
}

/// Move the ROW records of `first..=last` by `delta` rows.
///
/// ROW records already at a destination row are replaced. The caller is
/// responsible for validating the band and its destination.
pub(crate) fn shift_row_records(stream: &mut RecordStream, first: u16, last: u16, delta: i32) {
    let in_band = |row: u16| first <= row && row <= last;
    let dest_first = (first as i32 + delta) as u16;
    let dest_last = (last as i32 + delta) as u16;
    let in_dest = |row: u16| dest_first <= row && row <= dest_last;

    stream.retain(|r| !matches!(r, Record::Row(row) if !in_band(row.row) && in_dest(row.row)));
    let mut moved = Vec::new();
    for record in stream.iter_mut() {
        if let Record::Row(row) = record
            && in_band(row.row)
        {
            row.row = (row.row as i32 + delta) as u16;
            moved.push(row.row);
        }
    }
    sort_row_block(stream);
    if let Some(dims) = find_record_mut!(stream, Dimensions) {
        for row in moved {
            dims.include_row(row as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, DimensionsRecord, Window2Record};

    fn stream() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::DefColWidth(8),
            Record::Dimensions(DimensionsRecord::default()),
            Record::Window2(Window2Record::default()),
            Record::Eof,
        ])
    }

    fn row_numbers(stream: &RecordStream) -> Vec<u16> {
        rows(stream).map(|r| r.row).collect()
    }

    #[test]
    fn test_rows_stay_sorted() {
        let mut records = stream();
        for row in [5, 1, 9, 3] {
            ensure_row(&mut records, row).unwrap();
        }
        assert_eq!(row_numbers(&records), vec![1, 3, 5, 9]);
        assert_eq!(records.locate_first(sid::ROW), Some(3));
        assert_eq!(records.locate_last(sid::ROW), Some(6));
        let Some(Record::Dimensions(dims)) = records.find_first(sid::DIMENSIONS) else {
            panic!("DIMENSIONS missing");
        };
        assert_eq!((dims.first_row, dims.last_row), (1, 10));
    }

    #[test]
    fn test_ensure_row_needs_dimensions() {
        let mut records = RecordStream::from_records(vec![Record::Eof]);
        assert!(ensure_row(&mut records, 0).unwrap_err().is_logic_error());
    }

    #[test]
    fn test_shift_replaces_destination() {
        let mut records = stream();
        for row in [1, 2, 5, 6] {
            ensure_row(&mut records, row).unwrap();
        }
        find_row_mut(&mut records, 1).unwrap().height = 400;
        shift_row_records(&mut records, 1, 2, 4);
        assert_eq!(row_numbers(&records), vec![5, 6]);
        assert_eq!(find_row(&records, 5).unwrap().height, 400);
    }

    #[test]
    fn test_check_row_bounds() {
        assert_eq!(check_row(65535).unwrap(), 65535);
        let err = check_row(65536).unwrap_err();
        assert!(err.to_string().contains("65536"));
    }
}
