//! Little-endian field decoding for BIFF record payloads.
//!
//! Every reader takes the full payload and an absolute offset so that record
//! decoders can address fields exactly as the record layout tables do.

use thiserror::Error;
use zerocopy::{F64, FromBytes, LE, U16, U32};

/// Binary parsing error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    #[error("Insufficient data: expected {expected}, got {available}")]
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn check(data: &[u8], offset: usize, width: usize) -> BinaryResult<()> {
    if offset + width > data.len() {
        return Err(BinaryError::InsufficientData {
            expected: offset + width,
            available: data.len(),
        });
    }
    Ok(())
}

/// Read a single byte at the given offset.
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> BinaryResult<u8> {
    check(data, offset, 1)?;
    Ok(data[offset])
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use biffsheet::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    check(data, offset, 2)?;
    U16::<LE>::read_from_bytes(&data[offset..offset + 2])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

/// Read a little-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    check(data, offset, 4)?;
    U32::<LE>::read_from_bytes(&data[offset..offset + 4])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Read a little-endian f64 from a byte slice at the given offset.
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> BinaryResult<f64> {
    check(data, offset, 8)?;
    F64::<LE>::read_from_bytes(&data[offset..offset + 8])
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read f64".to_string()))
}

/// Parse `char_count` UTF-16LE code units starting at `offset`.
pub fn parse_utf16le_string_len(
    data: &[u8],
    offset: usize,
    char_count: usize,
) -> BinaryResult<String> {
    check(data, offset, char_count * 2)?;
    let units: Vec<u16> = data[offset..offset + char_count * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map_err(|e| BinaryError::ParseError(format!("Invalid UTF-16 string: {}", e)))
}

/// Parse `length` compressed (8-bit, high byte zero) characters starting at `offset`.
pub fn parse_compressed_string_len(
    data: &[u8],
    offset: usize,
    length: usize,
) -> BinaryResult<String> {
    check(data, offset, length)?;
    Ok(data[offset..offset + length]
        .iter()
        .map(|&b| b as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(
            read_u32_le(&data, 0),
            Err(BinaryError::InsufficientData {
                expected: 4,
                available: 3
            })
        );
        assert!(read_u16_le(&data, 2).is_err());
        assert_eq!(read_u8(&data, 2).unwrap(), 0x03);
    }

    #[test]
    fn test_read_f64() {
        let data = 0.001f64.to_le_bytes();
        assert_eq!(read_f64_le(&data, 0).unwrap(), 0.001);
    }

    #[test]
    fn test_strings() {
        let data = [b'a', 0, b'b', 0, 0xE9];
        assert_eq!(parse_utf16le_string_len(&data, 0, 2).unwrap(), "ab");
        assert_eq!(parse_compressed_string_len(&data, 4, 1).unwrap(), "é");
    }
}
