//! Worksheet structure records: BOF, GUTS, WSBOOL, DIMENSIONS, ROW, COLINFO.

use bitflags::bitflags;

use crate::binary;
use crate::error::SheetResult;

use super::{expect_len, sid};

/// Highest row index addressable in BIFF8.
pub const MAX_ROW: u32 = 0xFFFF;
/// Highest column index addressable in BIFF8.
pub const MAX_COLUMN: u16 = 0x00FF;
/// Outline levels are stored in three bits.
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// BOF record that opens a worksheet substream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BofRecord {
    pub version: u16,
    pub substream: u16,
    pub build: u16,
    pub year: u16,
    pub history: u32,
    pub lowest_version: u32,
}

impl BofRecord {
    pub const BIFF8: u16 = 0x0600;
    pub const WORKSHEET: u16 = 0x0010;

    /// BOF for a worksheet, with the build identifiers Excel 97 writes.
    pub fn worksheet() -> Self {
        Self {
            version: Self::BIFF8,
            substream: Self::WORKSHEET,
            build: 0x0DBB,
            year: 0x07CC,
            history: 0x0000_00C1,
            lowest_version: 0x0000_0006,
        }
    }

    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::BOF, data, 16)?;
        Ok(Self {
            version: binary::read_u16_le(data, 0)?,
            substream: binary::read_u16_le(data, 2)?,
            build: binary::read_u16_le(data, 4)?,
            year: binary::read_u16_le(data, 6)?,
            history: binary::read_u32_le(data, 8)?,
            lowest_version: binary::read_u32_le(data, 12)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.substream.to_le_bytes());
        out.extend_from_slice(&self.build.to_le_bytes());
        out.extend_from_slice(&self.year.to_le_bytes());
        out.extend_from_slice(&self.history.to_le_bytes());
        out.extend_from_slice(&self.lowest_version.to_le_bytes());
    }
}

/// GUTS record: size of the outline gutters and the deepest outline levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GutsRecord {
    pub left_row_gutter: u16,
    pub top_col_gutter: u16,
    pub row_level_max: u16,
    pub col_level_max: u16,
}

impl GutsRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::GUTS, data, 8)?;
        Ok(Self {
            left_row_gutter: binary::read_u16_le(data, 0)?,
            top_col_gutter: binary::read_u16_le(data, 2)?,
            row_level_max: binary::read_u16_le(data, 4)?,
            col_level_max: binary::read_u16_le(data, 6)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.left_row_gutter.to_le_bytes());
        out.extend_from_slice(&self.top_col_gutter.to_le_bytes());
        out.extend_from_slice(&self.row_level_max.to_le_bytes());
        out.extend_from_slice(&self.col_level_max.to_le_bytes());
    }

    /// Gutter width and level count for a deepest outline level of `max_level`.
    pub fn gutter_for(max_level: u8) -> (u16, u16) {
        if max_level == 0 {
            (0, 0)
        } else {
            (29 + 12 * max_level as u16, max_level as u16 + 1)
        }
    }
}

/// DEFAULTROWHEIGHT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRowHeightRecord {
    pub options: u16,
    /// Height in twips
    pub height: u16,
}

impl DefaultRowHeightRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::DEFAULTROWHEIGHT, data, 4)?;
        Ok(Self {
            options: binary::read_u16_le(data, 0)?,
            height: binary::read_u16_le(data, 2)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.options.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
    }
}

bitflags! {
    /// WSBOOL option word ([MS-XLS] 2.4.376).
    ///
    /// Low byte holds the display flags, high byte the layout flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WsBoolFlags: u16 {
        const SHOW_AUTO_BREAKS = 0x0001;
        const DIALOG = 0x0010;
        const APPLY_STYLES = 0x0020;
        const ROW_SUMS_BELOW = 0x0040;
        const ROW_SUMS_RIGHT = 0x0080;
        const FIT_TO_PAGE = 0x0100;
        const DISPLAY_GUTS = 0x0400;
        const SYNC_HORIZONTAL = 0x1000;
        const SYNC_VERTICAL = 0x2000;
        const ALTERNATE_EXPRESSION = 0x4000;
        const ALTERNATE_FORMULA = 0x8000;

        const _ = !0;
    }
}

impl Default for WsBoolFlags {
    /// On-disk value Excel writes for a fresh worksheet.
    fn default() -> Self {
        WsBoolFlags::from_bits_retain(0x04C1)
    }
}

/// DIMENSIONS record: used range of the sheet, last row and column exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimensionsRecord {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
    pub reserved: u16,
}

impl DimensionsRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::DIMENSIONS, data, 14)?;
        Ok(Self {
            first_row: binary::read_u32_le(data, 0)?,
            last_row: binary::read_u32_le(data, 4)?,
            first_col: binary::read_u16_le(data, 8)?,
            last_col: binary::read_u16_le(data, 10)?,
            reserved: binary::read_u16_le(data, 12)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.first_row.to_le_bytes());
        out.extend_from_slice(&self.last_row.to_le_bytes());
        out.extend_from_slice(&self.first_col.to_le_bytes());
        out.extend_from_slice(&self.last_col.to_le_bytes());
        out.extend_from_slice(&self.reserved.to_le_bytes());
    }

    /// Widen the used range so that it covers `row`.
    pub fn include_row(&mut self, row: u32) {
        if self.first_row == self.last_row {
            self.first_row = row;
            self.last_row = row + 1;
        } else {
            self.first_row = self.first_row.min(row);
            self.last_row = self.last_row.max(row + 1);
        }
    }
}

bitflags! {
    /// ROW option word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowFlags: u16 {
        const OUTLINE_LEVEL = 0x0007;
        const COLLAPSED = 0x0010;
        const ZERO_HEIGHT = 0x0020;
        const BAD_FONT_HEIGHT = 0x0040;
        const FORMATTED = 0x0080;
        const ALWAYS_SET = 0x0100;

        const _ = !0;
    }
}

/// ROW record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub row: u16,
    pub first_col: u16,
    pub last_col: u16,
    /// Height in twips; bit 15 marks the default height
    pub height: u16,
    pub optimize: u16,
    pub reserved: u16,
    pub options: RowFlags,
    pub xf_index: u16,
}

impl RowRecord {
    /// Empty row with default height and the default cell format.
    pub fn new(row: u16) -> Self {
        Self {
            row,
            first_col: 0,
            last_col: 0,
            height: 0x00FF,
            optimize: 0,
            reserved: 0,
            options: RowFlags::ALWAYS_SET,
            xf_index: 0x000F,
        }
    }

    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::ROW, data, 16)?;
        Ok(Self {
            row: binary::read_u16_le(data, 0)?,
            first_col: binary::read_u16_le(data, 2)?,
            last_col: binary::read_u16_le(data, 4)?,
            height: binary::read_u16_le(data, 6)?,
            optimize: binary::read_u16_le(data, 8)?,
            reserved: binary::read_u16_le(data, 10)?,
            options: RowFlags::from_bits_retain(binary::read_u16_le(data, 12)?),
            xf_index: binary::read_u16_le(data, 14)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.row.to_le_bytes());
        out.extend_from_slice(&self.first_col.to_le_bytes());
        out.extend_from_slice(&self.last_col.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.optimize.to_le_bytes());
        out.extend_from_slice(&self.reserved.to_le_bytes());
        out.extend_from_slice(&self.options.bits().to_le_bytes());
        out.extend_from_slice(&self.xf_index.to_le_bytes());
    }

    pub fn outline_level(&self) -> u8 {
        (self.options.bits() & RowFlags::OUTLINE_LEVEL.bits()) as u8
    }

    pub fn set_outline_level(&mut self, level: u8) {
        let level = level.min(MAX_OUTLINE_LEVEL) as u16;
        self.options = RowFlags::from_bits_retain(
            (self.options.bits() & !RowFlags::OUTLINE_LEVEL.bits()) | level,
        );
    }
}

/// COLINFO record describing a run of columns sharing width and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfoRecord {
    pub first_col: u16,
    pub last_col: u16,
    /// Width in 1/256 of a character
    pub width: u16,
    pub xf_index: u16,
    pub options: u16,
    /// Trailing reserved word, `None` when the record was read without it
    pub reserved: Option<u16>,
}

impl ColumnInfoRecord {
    const HIDDEN: u16 = 0x0001;
    const LEVEL_MASK: u16 = 0x0700;
    const LEVEL_SHIFT: u16 = 8;
    const COLLAPSED: u16 = 0x1000;

    pub fn new(first_col: u16, last_col: u16, width: u16) -> Self {
        Self {
            first_col,
            last_col,
            width,
            xf_index: 0x000F,
            options: 0,
            reserved: Some(0),
        }
    }

    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        // Some writers omit the trailing reserved word.
        if data.len() != 12 {
            expect_len(sid::COLINFO, data, 10)?;
        }
        Ok(Self {
            first_col: binary::read_u16_le(data, 0)?,
            last_col: binary::read_u16_le(data, 2)?,
            width: binary::read_u16_le(data, 4)?,
            xf_index: binary::read_u16_le(data, 6)?,
            options: binary::read_u16_le(data, 8)?,
            reserved: if data.len() == 12 {
                Some(binary::read_u16_le(data, 10)?)
            } else {
                None
            },
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.first_col.to_le_bytes());
        out.extend_from_slice(&self.last_col.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.xf_index.to_le_bytes());
        out.extend_from_slice(&self.options.to_le_bytes());
        if let Some(reserved) = self.reserved {
            out.extend_from_slice(&reserved.to_le_bytes());
        }
    }

    pub fn contains(&self, col: u16) -> bool {
        self.first_col <= col && col <= self.last_col
    }

    pub fn hidden(&self) -> bool {
        self.options & Self::HIDDEN != 0
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            self.options |= Self::HIDDEN;
        } else {
            self.options &= !Self::HIDDEN;
        }
    }

    pub fn collapsed(&self) -> bool {
        self.options & Self::COLLAPSED != 0
    }

    pub fn outline_level(&self) -> u8 {
        ((self.options & Self::LEVEL_MASK) >> Self::LEVEL_SHIFT) as u8
    }

    pub fn set_outline_level(&mut self, level: u8) {
        let level = level.min(MAX_OUTLINE_LEVEL) as u16;
        self.options = (self.options & !Self::LEVEL_MASK) | (level << Self::LEVEL_SHIFT);
    }
}
