//! View records: WINDOW2, SCL and SELECTION.

use bitflags::bitflags;

use crate::binary;
use crate::error::{SheetError, SheetResult};

use super::{expect_len, sid};

bitflags! {
    /// WINDOW2 option word ([MS-XLS] 2.4.346).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Window2Flags: u16 {
        const DISPLAY_FORMULAS = 0x0001;
        const DISPLAY_GRIDLINES = 0x0002;
        const DISPLAY_ROW_COL_HEADINGS = 0x0004;
        const FREEZE_PANES = 0x0008;
        const DISPLAY_ZEROS = 0x0010;
        const DEFAULT_HEADER = 0x0020;
        const ARABIC = 0x0040;
        const DISPLAY_GUTS = 0x0080;
        const FREEZE_PANES_NO_SPLIT = 0x0100;
        const SELECTED = 0x0200;
        const ACTIVE = 0x0400;
        const PAGE_BREAK_PREVIEW = 0x0800;

        const _ = !0;
    }
}

impl Default for Window2Flags {
    fn default() -> Self {
        // gridlines, headings, zeros, default header colour, guts,
        // no-split freeze, selected and active
        Window2Flags::from_bits_retain(0x06B6)
    }
}

/// WINDOW2 record (worksheet variant, 18 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window2Record {
    pub options: Window2Flags,
    pub top_row: u16,
    pub left_col: u16,
    pub header_color: u32,
    pub page_break_zoom: u16,
    pub normal_zoom: u16,
    pub reserved: u32,
}

impl Default for Window2Record {
    fn default() -> Self {
        Self {
            options: Window2Flags::default(),
            top_row: 0,
            left_col: 0,
            header_color: 0x40,
            page_break_zoom: 0,
            normal_zoom: 0,
            reserved: 0,
        }
    }
}

impl Window2Record {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::WINDOW2, data, 18)?;
        Ok(Self {
            options: Window2Flags::from_bits_retain(binary::read_u16_le(data, 0)?),
            top_row: binary::read_u16_le(data, 2)?,
            left_col: binary::read_u16_le(data, 4)?,
            header_color: binary::read_u32_le(data, 6)?,
            page_break_zoom: binary::read_u16_le(data, 10)?,
            normal_zoom: binary::read_u16_le(data, 12)?,
            reserved: binary::read_u32_le(data, 14)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.options.bits().to_le_bytes());
        out.extend_from_slice(&self.top_row.to_le_bytes());
        out.extend_from_slice(&self.left_col.to_le_bytes());
        out.extend_from_slice(&self.header_color.to_le_bytes());
        out.extend_from_slice(&self.page_break_zoom.to_le_bytes());
        out.extend_from_slice(&self.normal_zoom.to_le_bytes());
        out.extend_from_slice(&self.reserved.to_le_bytes());
    }
}

/// SCL record: zoom as a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SclRecord {
    pub numerator: u16,
    pub denominator: u16,
}

impl SclRecord {
    /// Zoom fraction; both terms must be in `1..=65535`.
    pub fn new(numerator: u16, denominator: u16) -> SheetResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(SheetError::InvalidArgument(format!(
                "zoom {}/{} must have a non-zero numerator and denominator",
                numerator, denominator
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::SCL, data, 4)?;
        Ok(Self {
            numerator: binary::read_u16_le(data, 0)?,
            denominator: binary::read_u16_le(data, 2)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.numerator.to_le_bytes());
        out.extend_from_slice(&self.denominator.to_le_bytes());
    }
}

/// One selected range inside a SELECTION record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionRef {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u8,
    pub last_col: u8,
}

/// SELECTION record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRecord {
    pub pane: u8,
    pub active_row: u16,
    pub active_col: u16,
    pub active_ref: u16,
    pub refs: Vec<SelectionRef>,
}

impl Default for SelectionRecord {
    /// Cell A1 selected in the top-left pane.
    fn default() -> Self {
        Self {
            pane: 3,
            active_row: 0,
            active_col: 0,
            active_ref: 0,
            refs: vec![SelectionRef::default()],
        }
    }
}

impl SelectionRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        let count = binary::read_u16_le(data, 7)? as usize;
        expect_len(sid::SELECTION, data, 9 + count * 6)?;
        let mut refs = Vec::with_capacity(count);
        for i in 0..count {
            let offset = 9 + i * 6;
            refs.push(SelectionRef {
                first_row: binary::read_u16_le(data, offset)?,
                last_row: binary::read_u16_le(data, offset + 2)?,
                first_col: binary::read_u8(data, offset + 4)?,
                last_col: binary::read_u8(data, offset + 5)?,
            });
        }
        Ok(Self {
            pane: binary::read_u8(data, 0)?,
            active_row: binary::read_u16_le(data, 1)?,
            active_col: binary::read_u16_le(data, 3)?,
            active_ref: binary::read_u16_le(data, 5)?,
            refs,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.pane);
        out.extend_from_slice(&self.active_row.to_le_bytes());
        out.extend_from_slice(&self.active_col.to_le_bytes());
        out.extend_from_slice(&self.active_ref.to_le_bytes());
        out.extend_from_slice(&(self.refs.len() as u16).to_le_bytes());
        for r in &self.refs {
            out.extend_from_slice(&r.first_row.to_le_bytes());
            out.extend_from_slice(&r.last_row.to_le_bytes());
            out.push(r.first_col);
            out.push(r.last_col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window2_default_matches_excel() {
        let mut out = Vec::new();
        Window2Record::default().encode(&mut out);
        assert_eq!(out.len(), 18);
        assert_eq!(&out[0..2], &[0xB6, 0x06]);
        let flags = Window2Flags::default();
        assert!(flags.contains(Window2Flags::DISPLAY_GRIDLINES));
        assert!(flags.contains(Window2Flags::DISPLAY_ROW_COL_HEADINGS));
        assert!(!flags.contains(Window2Flags::DISPLAY_FORMULAS));
    }

    #[test]
    fn test_zero_zoom_rejected() {
        assert!(SclRecord::new(0, 4).is_err());
        assert!(SclRecord::new(3, 0).is_err());
        assert_eq!(SclRecord::new(3, 4).unwrap().denominator, 4);
    }

    #[test]
    fn test_selection_layout() {
        let mut out = Vec::new();
        SelectionRecord::default().encode(&mut out);
        assert_eq!(out.len(), 15);
        assert_eq!(SelectionRecord::parse(&out).unwrap(), SelectionRecord::default());
    }
}
