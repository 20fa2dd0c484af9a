//! Sheet protection block: PROTECT, SCENPROTECT, OBJPROTECT and PASSWORD.

use std::ops::{Deref, DerefMut};

use crate::records::{Flag, Record, sid};
use crate::stream::{RecordStream, find_record};

/// Legacy 16-bit password verifier stored in the PASSWORD record.
///
/// This is the checksum Excel has always used for sheet passwords, not a
/// cryptographic hash; many passwords share a verifier.
///
/// # Examples
///
/// ```
/// use biffsheet::sheet::password_hash;
///
/// assert_eq!(password_hash("abcdefghij"), 0xFEF1);
/// ```
pub fn password_hash(password: &str) -> u16 {
    let bytes = password.as_bytes();
    let mut hash: u16 = 0;
    for &byte in bytes.iter().rev() {
        hash = ((hash >> 14) & 0x01) | ((hash << 1) & 0x7FFF);
        hash ^= byte as u16;
    }
    hash = ((hash >> 14) & 0x01) | ((hash << 1) & 0x7FFF);
    hash ^= bytes.len() as u16;
    hash ^ 0xCE4B
}

/// Which parts of a sheet are protected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtectionState {
    pub sheet: bool,
    pub objects: bool,
    pub scenarios: bool,
}

/// View over the protection records of one sheet.
pub struct ProtectionAggregate<S> {
    stream: S,
}

impl<S> ProtectionAggregate<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S: Deref<Target = RecordStream>> ProtectionAggregate<S> {
    fn flag(&self, record_sid: u16) -> bool {
        match self.stream.find_first(record_sid) {
            Some(Record::Protect(v) | Record::ObjProtect(v) | Record::ScenProtect(v)) => v.get(),
            _ => false,
        }
    }

    pub fn state(&self) -> ProtectionState {
        ProtectionState {
            sheet: self.flag(sid::PROTECT),
            objects: self.flag(sid::OBJPROTECT),
            scenarios: self.flag(sid::SCENPROTECT),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.flag(sid::PROTECT)
    }

    /// Stored password verifier, absent when no PASSWORD record exists.
    pub fn password_hash(&self) -> Option<u16> {
        find_record!(self.stream, Password).copied()
    }
}

impl<S: DerefMut<Target = RecordStream>> ProtectionAggregate<S> {
    fn set_flag(&mut self, record_sid: u16, value: bool, make: fn(Flag) -> Record) {
        match self.stream.get_or_insert_with(record_sid, || make(value.into())) {
            Record::Protect(v) | Record::ObjProtect(v) | Record::ScenProtect(v) => v.set(value),
            _ => {},
        }
    }

    /// Protect the sheet, its objects and its scenarios with `password`.
    ///
    /// An empty password stores a zero verifier.
    pub fn protect(&mut self, password: &str) {
        let hash = if password.is_empty() {
            0
        } else {
            password_hash(password)
        };
        self.set_flag(sid::PROTECT, true, Record::Protect);
        self.set_flag(sid::SCENPROTECT, true, Record::ScenProtect);
        self.set_flag(sid::OBJPROTECT, true, Record::ObjProtect);
        if let Record::Password(v) = self
            .stream
            .get_or_insert_with(sid::PASSWORD, || Record::Password(hash))
        {
            *v = hash;
        }
    }

    /// Clear sheet protection. Object and scenario flags and the stored
    /// password are kept, so the sheet can be protected again as before.
    pub fn unprotect(&mut self) {
        self.set_protect(false);
    }

    /// Set only the PROTECT flag.
    pub fn set_protect(&mut self, value: bool) {
        self.set_flag(sid::PROTECT, value, Record::Protect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, PrintSetupRecord};

    fn stream() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::Setup(PrintSetupRecord::default()),
            Record::DefColWidth(8),
            Record::Eof,
        ])
    }

    #[test]
    fn test_password_hash() {
        assert_eq!(password_hash("abcdefghij"), 0xFEF1);
        assert_eq!(password_hash("password"), 0x83AF);
    }

    #[test]
    fn test_protect_creates_block_in_order() {
        let mut records = stream();
        let mut protection = ProtectionAggregate::new(&mut records);
        assert_eq!(protection.state(), ProtectionState::default());
        assert_eq!(protection.password_hash(), None);

        protection.protect("abcdefghij");
        assert_eq!(
            protection.state(),
            ProtectionState {
                sheet: true,
                objects: true,
                scenarios: true
            }
        );
        assert_eq!(protection.password_hash(), Some(0xFEF1));

        let sids: Vec<u16> = records.iter().map(|r| r.sid()).collect();
        assert_eq!(
            sids,
            vec![
                sid::BOF,
                sid::SETUP,
                sid::PROTECT,
                sid::SCENPROTECT,
                sid::OBJPROTECT,
                sid::PASSWORD,
                sid::DEFCOLWIDTH,
                sid::EOF
            ]
        );
    }

    #[test]
    fn test_unprotect_keeps_password() {
        let mut records = stream();
        let mut protection = ProtectionAggregate::new(&mut records);
        protection.protect("secret");
        let hash = protection.password_hash();
        protection.unprotect();
        assert!(!protection.is_protected());
        assert!(protection.state().objects);
        assert_eq!(protection.password_hash(), hash);

        protection.set_protect(true);
        assert!(protection.is_protected());
    }

    #[test]
    fn test_set_protect_alone() {
        let mut records = stream();
        let mut protection = ProtectionAggregate::new(&mut records);
        protection.set_protect(false);
        assert!(!protection.is_protected());
        assert_eq!(protection.password_hash(), None);
        assert!(records.contains(sid::PROTECT));
        assert!(!records.contains(sid::OBJPROTECT));
    }
}
