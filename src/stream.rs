//! Ordered record storage for one worksheet.
//!
//! The stream never reorders on its own. Records keep the order they were
//! read or inserted in; callers that need a record next to another one
//! compute the position from the live sequence at the time of the mutation.

use std::io::Write;

use crate::error::{SheetError, SheetResult};
use crate::records::{Record, sid};

/// First record of the given variant, by shared reference.
macro_rules! find_record {
    ($stream:expr, $variant:ident) => {
        $stream.iter().find_map(|r| match r {
            $crate::records::Record::$variant(v) => Some(v),
            _ => None,
        })
    };
}

/// First record of the given variant, by mutable reference.
macro_rules! find_record_mut {
    ($stream:expr, $variant:ident) => {
        $stream.iter_mut().find_map(|r| match r {
            $crate::records::Record::$variant(v) => Some(v),
            _ => None,
        })
    };
}

pub(crate) use {find_record, find_record_mut};

/// Ordered, position-addressable sequence of worksheet records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStream {
    records: Vec<Record>,
}

impl RecordStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.records.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Insert `record` so that it ends up at `position`.
    pub fn insert_at(&mut self, position: usize, record: Record) -> SheetResult<()> {
        if position > self.records.len() {
            return Err(SheetError::out_of_range(
                "record position",
                position as i64,
                self.records.len() as i64,
            ));
        }
        self.records.insert(position, record);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Record> {
        if index < self.records.len() {
            Some(self.records.remove(index))
        } else {
            None
        }
    }

    /// Index of the first record of type `record_sid`.
    pub fn locate_first(&self, record_sid: u16) -> Option<usize> {
        self.records.iter().position(|r| r.sid() == record_sid)
    }

    pub fn locate_last(&self, record_sid: u16) -> Option<usize> {
        self.records.iter().rposition(|r| r.sid() == record_sid)
    }

    pub fn find_first(&self, record_sid: u16) -> Option<&Record> {
        self.records.iter().find(|r| r.sid() == record_sid)
    }

    pub fn find_first_mut(&mut self, record_sid: u16) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.sid() == record_sid)
    }

    pub fn contains(&self, record_sid: u16) -> bool {
        self.locate_first(record_sid).is_some()
    }

    /// Index of a record that every well-formed sheet carries.
    pub fn require(&self, record_sid: u16) -> SheetResult<usize> {
        self.locate_first(record_sid)
            .ok_or_else(|| SheetError::missing(record_sid))
    }

    /// Where a new record of type `record_sid` belongs.
    ///
    /// After the last record whose type comes no later in
    /// [`sid::SHEET_ORDER`], else before the first record whose type comes
    /// later, else before EOF. Types outside the order go before EOF.
    pub fn position_for(&self, record_sid: u16) -> usize {
        let before_eof = || {
            self.locate_last(sid::EOF)
                .unwrap_or(self.records.len())
        };
        let Some(rank) = sheet_rank(record_sid) else {
            return before_eof();
        };
        let last_predecessor = self
            .records
            .iter()
            .rposition(|r| sheet_rank(r.sid()).is_some_and(|other| other <= rank));
        if let Some(index) = last_predecessor {
            return index + 1;
        }
        self.records
            .iter()
            .position(|r| sheet_rank(r.sid()).is_some_and(|other| other > rank))
            .unwrap_or_else(before_eof)
    }

    /// Insert `record` at its canonical position and return that position.
    pub fn insert_ordered(&mut self, record: Record) -> usize {
        let position = self.position_for(record.sid());
        log::debug!("creating {} at position {}", record.name(), position);
        self.records.insert(position, record);
        position
    }

    /// The first record of type `record_sid`, created with `make` when absent.
    pub fn get_or_insert_with(
        &mut self,
        record_sid: u16,
        make: impl FnOnce() -> Record,
    ) -> &mut Record {
        let index = match self.locate_first(record_sid) {
            Some(index) => index,
            None => self.insert_ordered(make()),
        };
        &mut self.records[index]
    }

    /// Remove every record of type `record_sid`; returns how many were removed.
    pub fn remove_all(&mut self, record_sid: u16) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.sid() != record_sid);
        before - self.records.len()
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&Record) -> bool) {
        self.records.retain(f);
    }

    /// Serialize every record in sequence order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> SheetResult<usize> {
        let mut written = 0;
        for record in &self.records {
            written += record.write_to(writer)?;
        }
        Ok(written)
    }
}

impl<'a> IntoIterator for &'a RecordStream {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn sheet_rank(record_sid: u16) -> Option<usize> {
    sid::SHEET_ORDER.iter().position(|s| *s == record_sid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, Flag, Window2Record};

    fn skeleton() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::Gridset(Flag::ON),
            Record::DefColWidth(8),
            Record::Window2(Window2Record::default()),
            Record::Eof,
        ])
    }

    fn sids(stream: &RecordStream) -> Vec<u16> {
        stream.iter().map(|r| r.sid()).collect()
    }

    #[test]
    fn test_locate_and_find() {
        let stream = skeleton();
        assert_eq!(stream.locate_first(sid::WINDOW2), Some(3));
        assert_eq!(stream.locate_first(sid::SCL), None);
        assert!(matches!(stream.find_first(sid::GRIDSET), Some(Record::Gridset(Flag::ON))));
        assert!(find_record!(stream, Window2).is_some());
        assert!(stream.require(sid::SCL).unwrap_err().is_logic_error());
    }

    #[test]
    fn test_ordered_insertion() {
        let mut stream = skeleton();
        stream.insert_ordered(Record::Uncalced(0));
        stream.insert_ordered(Record::Protect(Flag::ON));
        stream.insert_ordered(Record::MergedCells(Default::default()));
        stream.insert_ordered(Record::HCenter(Flag::OFF));
        assert_eq!(
            sids(&stream),
            vec![
                sid::BOF,
                sid::UNCALCED,
                sid::GRIDSET,
                sid::HCENTER,
                sid::PROTECT,
                sid::DEFCOLWIDTH,
                sid::WINDOW2,
                sid::MERGEDCELLS,
                sid::EOF
            ]
        );
    }

    #[test]
    fn test_successor_used_without_predecessor() {
        let mut stream =
            RecordStream::from_records(vec![Record::Window2(Window2Record::default()), Record::Eof]);
        stream.insert_ordered(Record::Gridset(Flag::OFF));
        assert_eq!(sids(&stream), vec![sid::GRIDSET, sid::WINDOW2, sid::EOF]);
    }

    #[test]
    fn test_unordered_type_goes_before_eof() {
        let mut stream = skeleton();
        let position = stream.insert_ordered(Record::Unknown {
            sid: 0x01B0,
            data: vec![],
        });
        assert_eq!(position, 4);
        assert_eq!(stream.get(5).map(|r| r.sid()), Some(sid::EOF));
    }

    #[test]
    fn test_get_or_insert_is_lazy() {
        let mut stream = skeleton();
        if let Record::VCenter(v) =
            stream.get_or_insert_with(sid::VCENTER, || Record::VCenter(Flag::OFF))
        {
            v.set(true);
        }
        let len = stream.len();
        stream.get_or_insert_with(sid::VCENTER, || Record::VCenter(Flag::OFF));
        assert_eq!(stream.len(), len);
        assert!(matches!(stream.find_first(sid::VCENTER), Some(Record::VCenter(Flag::ON))));
    }

    #[test]
    fn test_insert_and_remove_bounds() {
        let mut stream = skeleton();
        assert!(stream.insert_at(99, Record::Eof).is_err());
        assert!(stream.remove_at(99).is_none());
        stream.insert_at(0, Record::Uncalced(0)).unwrap();
        assert_eq!(stream.remove_at(0), Some(Record::Uncalced(0)));
        assert_eq!(stream.remove_all(sid::EOF), 1);
    }
}
