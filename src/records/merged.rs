//! MERGEDCELLS record and the cell range it stores.

use crate::binary;
use crate::error::{SheetError, SheetResult};

use super::sheet::{MAX_COLUMN, MAX_ROW};
use super::{expect_len, sid};

/// Most ranges a single MERGEDCELLS record may hold.
pub const MAX_MERGED_REGIONS: usize = 1027;

/// Rectangular block of cells, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRangeAddress {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl CellRangeAddress {
    pub fn new(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    /// Check that both corners are addressable in BIFF8.
    pub fn validate(&self) -> SheetResult<()> {
        for row in [self.first_row, self.last_row] {
            if row > MAX_ROW {
                return Err(SheetError::out_of_range("row", row, MAX_ROW));
            }
        }
        for col in [self.first_col, self.last_col] {
            if col > MAX_COLUMN {
                return Err(SheetError::out_of_range("column", col, MAX_COLUMN));
            }
        }
        Ok(())
    }

    pub fn contains_row(&self, row: u32) -> bool {
        self.first_row <= row && row <= self.last_row
    }
}

/// MERGEDCELLS record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedCellsRecord {
    pub regions: Vec<CellRangeAddress>,
}

impl MergedCellsRecord {
    pub(crate) fn parse(data: &[u8]) -> SheetResult<Self> {
        let count = binary::read_u16_le(data, 0)? as usize;
        expect_len(sid::MERGEDCELLS, data, 2 + count * 8)?;
        let mut regions = Vec::with_capacity(count);
        for i in 0..count {
            let offset = 2 + i * 8;
            regions.push(CellRangeAddress {
                first_row: binary::read_u16_le(data, offset)? as u32,
                last_row: binary::read_u16_le(data, offset + 2)? as u32,
                first_col: binary::read_u16_le(data, offset + 4)?,
                last_col: binary::read_u16_le(data, offset + 6)?,
            });
        }
        Ok(Self { regions })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.regions.len() as u16).to_le_bytes());
        // Rows were range-checked when the region entered the table.
        for r in &self.regions {
            out.extend_from_slice(&(r.first_row as u16).to_le_bytes());
            out.extend_from_slice(&(r.last_row as u16).to_le_bytes());
            out.extend_from_slice(&r.first_col.to_le_bytes());
            out.extend_from_slice(&r.last_col.to_le_bytes());
        }
    }

    pub fn is_full(&self) -> bool {
        self.regions.len() >= MAX_MERGED_REGIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(CellRangeAddress::new(0, 1, 0, 1).validate().is_ok());
        let err = CellRangeAddress::new(0, 70000, 0, 1).validate().unwrap_err();
        assert!(err.to_string().contains("70000"));
        assert!(CellRangeAddress::new(0, 1, 0, 256).validate().is_err());
    }

    #[test]
    fn test_layout() {
        let record = MergedCellsRecord {
            regions: vec![CellRangeAddress::new(1, 2, 0, 1)],
        };
        let mut out = Vec::new();
        record.encode(&mut out);
        assert_eq!(out, vec![1, 0, 1, 0, 2, 0, 0, 0, 1, 0]);
        assert_eq!(MergedCellsRecord::parse(&out).unwrap(), record);
    }
}
