//! Page settings records: SETUP, margins and manual page breaks.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::binary;
use crate::error::{SheetError, SheetResult};

use super::{expect_len, sid};

bitflags! {
    /// SETUP option word ([MS-XLS] 2.4.257).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SetupFlags: u16 {
        /// Pages are printed left to right before top to bottom
        const LEFT_TO_RIGHT = 0x0001;
        /// Portrait orientation; clear means landscape
        const PORTRAIT = 0x0002;
        /// Printer fields are undefined
        const NO_PRINTER_SETTINGS = 0x0004;
        const NO_COLOR = 0x0008;
        const DRAFT = 0x0010;
        const NOTES = 0x0020;
        const NO_ORIENTATION = 0x0040;
        const USE_PAGE_START = 0x0080;

        const _ = !0;
    }
}

/// SETUP record.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSetupRecord {
    pub paper_size: u16,
    pub scale: u16,
    pub page_start: u16,
    pub fit_width: u16,
    pub fit_height: u16,
    pub options: SetupFlags,
    pub h_resolution: u16,
    pub v_resolution: u16,
    pub header_margin: f64,
    pub footer_margin: f64,
    pub copies: u16,
}

impl Default for PrintSetupRecord {
    fn default() -> Self {
        Self {
            paper_size: 1,
            scale: 100,
            page_start: 1,
            fit_width: 1,
            fit_height: 1,
            options: SetupFlags::PORTRAIT,
            h_resolution: 300,
            v_resolution: 300,
            header_margin: 0.5,
            footer_margin: 0.5,
            copies: 0,
        }
    }
}

impl PrintSetupRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        expect_len(sid::SETUP, data, 34)?;
        Ok(Self {
            paper_size: binary::read_u16_le(data, 0)?,
            scale: binary::read_u16_le(data, 2)?,
            page_start: binary::read_u16_le(data, 4)?,
            fit_width: binary::read_u16_le(data, 6)?,
            fit_height: binary::read_u16_le(data, 8)?,
            options: SetupFlags::from_bits_retain(binary::read_u16_le(data, 10)?),
            h_resolution: binary::read_u16_le(data, 12)?,
            v_resolution: binary::read_u16_le(data, 14)?,
            header_margin: binary::read_f64_le(data, 16)?,
            footer_margin: binary::read_f64_le(data, 24)?,
            copies: binary::read_u16_le(data, 32)?,
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.paper_size.to_le_bytes());
        out.extend_from_slice(&self.scale.to_le_bytes());
        out.extend_from_slice(&self.page_start.to_le_bytes());
        out.extend_from_slice(&self.fit_width.to_le_bytes());
        out.extend_from_slice(&self.fit_height.to_le_bytes());
        out.extend_from_slice(&self.options.bits().to_le_bytes());
        out.extend_from_slice(&self.h_resolution.to_le_bytes());
        out.extend_from_slice(&self.v_resolution.to_le_bytes());
        out.extend_from_slice(&self.header_margin.to_le_bytes());
        out.extend_from_slice(&self.footer_margin.to_le_bytes());
        out.extend_from_slice(&self.copies.to_le_bytes());
    }

    pub fn landscape(&self) -> bool {
        !self.options.contains(SetupFlags::PORTRAIT)
    }

    pub fn set_landscape(&mut self, landscape: bool) {
        self.options.set(SetupFlags::PORTRAIT, !landscape);
    }
}

/// Which edge a margin record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarginKind {
    Left,
    Right,
    Top,
    Bottom,
}

impl MarginKind {
    pub fn sid(self) -> u16 {
        match self {
            MarginKind::Left => sid::LEFTMARGIN,
            MarginKind::Right => sid::RIGHTMARGIN,
            MarginKind::Top => sid::TOPMARGIN,
            MarginKind::Bottom => sid::BOTTOMMARGIN,
        }
    }

    /// Margin Excel assumes when the record is absent, in inches.
    pub fn default_inches(self) -> f64 {
        match self {
            MarginKind::Left | MarginKind::Right => 0.75,
            MarginKind::Top | MarginKind::Bottom => 1.0,
        }
    }
}

/// One manual page break.
///
/// For row breaks `position` is the row and `sub_from..=sub_to` the columns
/// it spans; column breaks swap the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageBreak {
    pub position: u16,
    pub sub_from: u16,
    pub sub_to: u16,
}

/// HORIZONTALPAGEBREAKS / VERTICALPAGEBREAKS payload.
///
/// Breaks are kept in the order they were read or added; queries sort them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBreakRecord {
    breaks: SmallVec<[PageBreak; 8]>,
}

impl PageBreakRecord {
    pub(crate) fn parse(record_sid: u16, data: &[u8]) -> SheetResult<Self> {
        let count = binary::read_u16_le(data, 0)? as usize;
        expect_len(record_sid, data, 2 + count * 6)?;
        let mut breaks = SmallVec::with_capacity(count);
        for i in 0..count {
            let offset = 2 + i * 6;
            breaks.push(PageBreak {
                position: binary::read_u16_le(data, offset)?,
                sub_from: binary::read_u16_le(data, offset + 2)?,
                sub_to: binary::read_u16_le(data, offset + 4)?,
            });
        }
        Ok(Self { breaks })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.breaks.len() as u16).to_le_bytes());
        for b in &self.breaks {
            out.extend_from_slice(&b.position.to_le_bytes());
            out.extend_from_slice(&b.sub_from.to_le_bytes());
            out.extend_from_slice(&b.sub_to.to_le_bytes());
        }
    }

    /// Add a break; an existing break at the same position is left untouched.
    pub fn add(&mut self, page_break: PageBreak) -> SheetResult<bool> {
        if self.contains(page_break.position) {
            return Ok(false);
        }
        // 2 + 6 * n must stay within a single record
        if 2 + (self.breaks.len() + 1) * 6 > super::MAX_RECORD_DATA {
            return Err(SheetError::InvalidArgument(format!(
                "too many page breaks ({})",
                self.breaks.len() + 1
            )));
        }
        self.breaks.push(page_break);
        Ok(true)
    }

    pub fn remove(&mut self, position: u16) -> bool {
        let before = self.breaks.len();
        self.breaks.retain(|b| b.position != position);
        before != self.breaks.len()
    }

    pub fn contains(&self, position: u16) -> bool {
        self.breaks.iter().any(|b| b.position == position)
    }

    pub fn len(&self) -> usize {
        self.breaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }

    /// Breaks in ascending position order.
    pub fn sorted(&self) -> Vec<PageBreak> {
        let mut breaks = self.breaks.to_vec();
        breaks.sort_by_key(|b| b.position);
        breaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_orientation() {
        let mut setup = PrintSetupRecord::default();
        assert!(!setup.landscape());
        setup.set_landscape(true);
        assert!(setup.landscape());
        assert_eq!(setup.options.bits() & 0x0002, 0);
    }

    #[test]
    fn test_setup_layout() {
        let mut out = Vec::new();
        PrintSetupRecord::default().encode(&mut out);
        assert_eq!(out.len(), 34);
        assert_eq!(PrintSetupRecord::parse(&out).unwrap(), PrintSetupRecord::default());
    }

    #[test]
    fn test_breaks_are_a_set() {
        let mut record = PageBreakRecord::default();
        let brk = |position| PageBreak {
            position,
            sub_from: 0,
            sub_to: 255,
        };
        assert!(record.add(brk(22)).unwrap());
        assert!(record.add(brk(10)).unwrap());
        assert!(!record.add(brk(22)).unwrap());
        assert_eq!(record.len(), 2);
        let positions: Vec<u16> = record.sorted().iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![10, 22]);
        assert!(record.remove(10));
        assert!(!record.remove(10));
    }

    #[test]
    fn test_break_count_mismatch() {
        let data = [2u8, 0, 1, 0, 0, 0, 255, 0];
        assert!(PageBreakRecord::parse(sid::HORIZONTALPAGEBREAKS, &data).is_err());
    }
}
