//! Error types for sheet record manipulation.
//!
//! Two classes of failure are kept apart: a structurally required record that
//! is missing ([`SheetError::MissingRecord`]) means the sheet was built or
//! loaded incorrectly and callers should treat it as fatal, while an absent
//! optional record is never an error and is reported through `Option`.

use thiserror::Error;

use crate::binary::BinaryError;
use crate::records::sid;

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Errors produced by the record model.
#[derive(Error, Debug)]
pub enum SheetError {
    /// I/O error from the serialization sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record that every well-formed sheet carries is absent
    #[error("Required record {name} (0x{sid:04X}) is missing from the sheet")]
    MissingRecord { sid: u16, name: &'static str },

    /// Row, column, region or sheet index outside the permitted range
    #[error("Invalid {kind} number ({index}) outside allowable range (0..{max})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        max: i64,
    },

    /// Argument rejected by the format (zero zoom denominator, bad sheet name, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sheet name already used in the workbook (names compare ignoring case)
    #[error("The workbook already contains a sheet named '{0}'")]
    DuplicateSheetName(String),

    /// Record payload has the wrong size for its type
    #[error("Invalid length for record 0x{sid:04X}: expected {expected}, found {found}")]
    InvalidLength {
        sid: u16,
        expected: usize,
        found: usize,
    },

    /// Byte stream ended inside a record
    #[error("Truncated record stream at offset {offset}: {message}")]
    Truncated { offset: usize, message: String },

    /// Payload exceeds what a single BIFF8 record may carry
    #[error("Record 0x{sid:04X} payload of {len} bytes exceeds the BIFF8 limit")]
    RecordTooLarge { sid: u16, len: usize },

    /// Escher stream inside an MSODRAWING record is malformed
    #[error("Invalid drawing data: {0}")]
    InvalidDrawing(String),

    /// A drawing group has no shape identifiers left in its block
    #[error("Drawing group {drawing_id} has no shape identifiers left")]
    DrawingIdsExhausted { drawing_id: u32 },

    /// Low-level field decoding failure
    #[error("Binary error: {0}")]
    Binary(#[from] BinaryError),
}

impl SheetError {
    /// Build the logic error for a required record that is not present.
    pub fn missing(record_sid: u16) -> Self {
        SheetError::MissingRecord {
            sid: record_sid,
            name: sid::name(record_sid),
        }
    }

    /// Build a range violation naming the offending index and the valid bound.
    pub fn out_of_range(kind: &'static str, index: impl Into<i64>, max: impl Into<i64>) -> Self {
        SheetError::IndexOutOfRange {
            kind,
            index: index.into(),
            max: max.into(),
        }
    }

    /// Whether this error signals a corrupted or mis-constructed sheet.
    pub fn is_logic_error(&self) -> bool {
        matches!(self, SheetError::MissingRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_message_names_index_and_bound() {
        let err = SheetError::out_of_range("row", -1, 65535);
        assert_eq!(
            err.to_string(),
            "Invalid row number (-1) outside allowable range (0..65535)"
        );
        assert!(!err.is_logic_error());
    }

    #[test]
    fn test_missing_record_is_logic_error() {
        let err = SheetError::missing(sid::WINDOW2);
        assert!(err.is_logic_error());
        assert!(err.to_string().contains("WINDOW2"));
    }
}
