//! BIFF8 XLUnicodeString encoding (cch u16, flags u8, characters).

use crate::binary;
use crate::error::SheetResult;

fn has_multibyte_char(s: &str) -> bool {
    s.chars().any(|c| c as u32 > 0xFF)
}

/// Encoded size of `value` as an XLUnicodeString.
pub(crate) fn unicode_string_size(value: &str) -> usize {
    if has_multibyte_char(value) {
        3 + value.encode_utf16().count() * 2
    } else {
        3 + value.chars().count()
    }
}

/// Append `value` as an XLUnicodeString.
///
/// Strings whose characters all fit in one byte are written compressed
/// (flag 0x00), everything else as UTF-16LE (flag 0x01).
pub(crate) fn write_unicode_string(out: &mut Vec<u8>, value: &str) {
    if has_multibyte_char(value) {
        let units: Vec<u16> = value.encode_utf16().collect();
        out.extend_from_slice(&(units.len() as u16).to_le_bytes());
        out.push(0x01);
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    } else {
        out.extend_from_slice(&(value.chars().count() as u16).to_le_bytes());
        out.push(0x00);
        out.extend(value.chars().map(|c| c as u8));
    }
}

/// Read an XLUnicodeString at `offset`, returning the string and the bytes consumed.
pub(crate) fn read_unicode_string(data: &[u8], offset: usize) -> SheetResult<(String, usize)> {
    let cch = binary::read_u16_le(data, offset)? as usize;
    let flags = binary::read_u8(data, offset + 2)?;
    if flags & 0x01 != 0 {
        let text = binary::parse_utf16le_string_len(data, offset + 3, cch)?;
        Ok((text, 3 + cch * 2))
    } else {
        let text = binary::parse_compressed_string_len(data, offset + 3, cch)?;
        Ok((text, 3 + cch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_and_wide() {
        for value in ["&CPage &P", "\u{090f}\u{0915}", ""] {
            let mut out = Vec::new();
            write_unicode_string(&mut out, value);
            assert_eq!(out.len(), unicode_string_size(value));
            let (text, used) = read_unicode_string(&out, 0).unwrap();
            assert_eq!(text, value);
            assert_eq!(used, out.len());
        }
    }
}
