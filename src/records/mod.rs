//! Typed BIFF8 worksheet records.
//!
//! Every record in a worksheet substream is framed as
//!
//! - Bytes 0-1: record type (SID)
//! - Bytes 2-3: payload length
//! - Bytes 4..: payload
//!
//! [`Record`] is a closed enum over the record types the sheet model works
//! with. Anything else is carried as [`Record::Unknown`] and written back
//! exactly as it was read.

pub mod merged;
pub mod page;
pub mod sheet;
pub mod sid;
pub(crate) mod text;
pub mod view;

use std::io::Write;

use crate::binary;
use crate::drawing::escher::DrawingRecord;
use crate::error::{SheetError, SheetResult};

pub use merged::{CellRangeAddress, MAX_MERGED_REGIONS, MergedCellsRecord};
pub use page::{MarginKind, PageBreak, PageBreakRecord, PrintSetupRecord, SetupFlags};
pub use sheet::{
    BofRecord, ColumnInfoRecord, DefaultRowHeightRecord, DimensionsRecord, GutsRecord,
    MAX_COLUMN, MAX_OUTLINE_LEVEL, MAX_ROW, RowFlags, RowRecord, WsBoolFlags,
};
pub use view::{SclRecord, SelectionRecord, SelectionRef, Window2Flags, Window2Record};

/// Largest payload a single BIFF8 record may carry.
pub(crate) const MAX_RECORD_DATA: usize = 8224;

/// Fail with [`SheetError::InvalidLength`] unless `data` is exactly `expected` bytes.
pub(crate) fn expect_len(record_sid: u16, data: &[u8], expected: usize) -> SheetResult<()> {
    if data.len() != expected {
        return Err(SheetError::InvalidLength {
            sid: record_sid,
            expected,
            found: data.len(),
        });
    }
    Ok(())
}

fn read_u16_payload(record_sid: u16, data: &[u8]) -> SheetResult<u16> {
    expect_len(record_sid, data, 2)?;
    Ok(binary::read_u16_le(data, 0)?)
}

fn read_flag_payload(record_sid: u16, data: &[u8]) -> SheetResult<Flag> {
    Ok(Flag(read_u16_payload(record_sid, data)?))
}

fn read_f64_payload(record_sid: u16, data: &[u8]) -> SheetResult<f64> {
    expect_len(record_sid, data, 8)?;
    Ok(binary::read_f64_le(data, 0)?)
}

fn margin(kind: MarginKind, data: &[u8]) -> SheetResult<Record> {
    Ok(Record::Margin {
        kind,
        inches: read_f64_payload(kind.sid(), data)?,
    })
}

fn read_optional_string(data: &[u8]) -> SheetResult<Option<String>> {
    if data.is_empty() {
        return Ok(None);
    }
    let (text, _) = text::read_unicode_string(data, 0)?;
    Ok(Some(text))
}

/// Write a record header (type and payload length).
pub(crate) fn write_record_header<W: Write>(
    writer: &mut W,
    record_type: u16,
    data_len: u16,
) -> SheetResult<()> {
    writer.write_all(&record_type.to_le_bytes())?;
    writer.write_all(&data_len.to_le_bytes())?;
    Ok(())
}

/// Two-byte boolean payload.
///
/// Any non-zero word reads as true. The word itself is kept, so a record read
/// from a file is written back unchanged until its value is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flag(pub u16);

impl Flag {
    pub const OFF: Flag = Flag(0);
    pub const ON: Flag = Flag(1);

    pub fn get(self) -> bool {
        self.0 != 0
    }

    /// Store `value`, keeping the stored word when it already reads that way.
    pub fn set(&mut self, value: bool) {
        if self.get() != value {
            *self = Flag::from(value);
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value { Flag::ON } else { Flag::OFF }
    }
}

/// One worksheet record with an owned payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Bof(BofRecord),
    Eof,
    /// Presence forces a full recalculation on load. Carries the reserved word.
    Uncalced(u16),
    CalcMode(u16),
    CalcCount(u16),
    RefMode(u16),
    Iteration(Flag),
    Delta(f64),
    SaveRecalc(Flag),
    PrintHeaders(Flag),
    PrintGridlines(Flag),
    Gridset(Flag),
    Guts(GutsRecord),
    DefaultRowHeight(DefaultRowHeightRecord),
    WsBool(WsBoolFlags),
    HorizontalPageBreaks(PageBreakRecord),
    VerticalPageBreaks(PageBreakRecord),
    Header(Option<String>),
    Footer(Option<String>),
    HCenter(Flag),
    VCenter(Flag),
    Margin { kind: MarginKind, inches: f64 },
    Setup(PrintSetupRecord),
    Protect(Flag),
    ScenProtect(Flag),
    ObjProtect(Flag),
    Password(u16),
    DefColWidth(u16),
    ColumnInfo(ColumnInfoRecord),
    Dimensions(DimensionsRecord),
    Row(RowRecord),
    Drawing(DrawingRecord),
    Window2(Window2Record),
    Scl(SclRecord),
    Selection(SelectionRecord),
    MergedCells(MergedCellsRecord),
    Unknown { sid: u16, data: Vec<u8> },
}

impl Record {
    /// Record type identifier.
    pub fn sid(&self) -> u16 {
        match self {
            Record::Bof(_) => sid::BOF,
            Record::Eof => sid::EOF,
            Record::Uncalced(_) => sid::UNCALCED,
            Record::CalcMode(_) => sid::CALCMODE,
            Record::CalcCount(_) => sid::CALCCOUNT,
            Record::RefMode(_) => sid::REFMODE,
            Record::Iteration(_) => sid::ITERATION,
            Record::Delta(_) => sid::DELTA,
            Record::SaveRecalc(_) => sid::SAVERECALC,
            Record::PrintHeaders(_) => sid::PRINTHEADERS,
            Record::PrintGridlines(_) => sid::PRINTGRIDLINES,
            Record::Gridset(_) => sid::GRIDSET,
            Record::Guts(_) => sid::GUTS,
            Record::DefaultRowHeight(_) => sid::DEFAULTROWHEIGHT,
            Record::WsBool(_) => sid::WSBOOL,
            Record::HorizontalPageBreaks(_) => sid::HORIZONTALPAGEBREAKS,
            Record::VerticalPageBreaks(_) => sid::VERTICALPAGEBREAKS,
            Record::Header(_) => sid::HEADER,
            Record::Footer(_) => sid::FOOTER,
            Record::HCenter(_) => sid::HCENTER,
            Record::VCenter(_) => sid::VCENTER,
            Record::Margin { kind, .. } => kind.sid(),
            Record::Setup(_) => sid::SETUP,
            Record::Protect(_) => sid::PROTECT,
            Record::ScenProtect(_) => sid::SCENPROTECT,
            Record::ObjProtect(_) => sid::OBJPROTECT,
            Record::Password(_) => sid::PASSWORD,
            Record::DefColWidth(_) => sid::DEFCOLWIDTH,
            Record::ColumnInfo(_) => sid::COLINFO,
            Record::Dimensions(_) => sid::DIMENSIONS,
            Record::Row(_) => sid::ROW,
            Record::Drawing(_) => sid::MSODRAWING,
            Record::Window2(_) => sid::WINDOW2,
            Record::Scl(_) => sid::SCL,
            Record::Selection(_) => sid::SELECTION,
            Record::MergedCells(_) => sid::MERGEDCELLS,
            Record::Unknown { sid, .. } => *sid,
        }
    }

    pub fn name(&self) -> &'static str {
        sid::name(self.sid())
    }

    /// Decode one record payload.
    ///
    /// A known type with a malformed payload is an error, except MSODRAWING:
    /// drawing data that does not decode is kept opaque so the sheet still
    /// loads and writes back unchanged.
    pub fn parse(record_sid: u16, data: &[u8]) -> SheetResult<Record> {
        let record = match record_sid {
            sid::BOF => Record::Bof(BofRecord::parse(data)?),
            sid::EOF => {
                expect_len(sid::EOF, data, 0)?;
                Record::Eof
            },
            sid::UNCALCED => Record::Uncalced(read_u16_payload(record_sid, data)?),
            sid::CALCMODE => Record::CalcMode(read_u16_payload(record_sid, data)?),
            sid::CALCCOUNT => Record::CalcCount(read_u16_payload(record_sid, data)?),
            sid::REFMODE => Record::RefMode(read_u16_payload(record_sid, data)?),
            sid::ITERATION => Record::Iteration(read_flag_payload(record_sid, data)?),
            sid::DELTA => Record::Delta(read_f64_payload(record_sid, data)?),
            sid::SAVERECALC => Record::SaveRecalc(read_flag_payload(record_sid, data)?),
            sid::PRINTHEADERS => Record::PrintHeaders(read_flag_payload(record_sid, data)?),
            sid::PRINTGRIDLINES => Record::PrintGridlines(read_flag_payload(record_sid, data)?),
            sid::GRIDSET => Record::Gridset(read_flag_payload(record_sid, data)?),
            sid::GUTS => Record::Guts(GutsRecord::parse(data)?),
            sid::DEFAULTROWHEIGHT => Record::DefaultRowHeight(DefaultRowHeightRecord::parse(data)?),
            sid::WSBOOL => {
                Record::WsBool(WsBoolFlags::from_bits_retain(read_u16_payload(record_sid, data)?))
            },
            sid::HORIZONTALPAGEBREAKS => {
                Record::HorizontalPageBreaks(PageBreakRecord::parse(record_sid, data)?)
            },
            sid::VERTICALPAGEBREAKS => {
                Record::VerticalPageBreaks(PageBreakRecord::parse(record_sid, data)?)
            },
            sid::HEADER => Record::Header(read_optional_string(data)?),
            sid::FOOTER => Record::Footer(read_optional_string(data)?),
            sid::HCENTER => Record::HCenter(read_flag_payload(record_sid, data)?),
            sid::VCENTER => Record::VCenter(read_flag_payload(record_sid, data)?),
            sid::LEFTMARGIN => margin(MarginKind::Left, data)?,
            sid::RIGHTMARGIN => margin(MarginKind::Right, data)?,
            sid::TOPMARGIN => margin(MarginKind::Top, data)?,
            sid::BOTTOMMARGIN => margin(MarginKind::Bottom, data)?,
            sid::SETUP => Record::Setup(PrintSetupRecord::parse(data)?),
            sid::PROTECT => Record::Protect(read_flag_payload(record_sid, data)?),
            sid::SCENPROTECT => Record::ScenProtect(read_flag_payload(record_sid, data)?),
            sid::OBJPROTECT => Record::ObjProtect(read_flag_payload(record_sid, data)?),
            sid::PASSWORD => Record::Password(read_u16_payload(record_sid, data)?),
            sid::DEFCOLWIDTH => Record::DefColWidth(read_u16_payload(record_sid, data)?),
            sid::COLINFO => Record::ColumnInfo(ColumnInfoRecord::parse(data)?),
            sid::DIMENSIONS => Record::Dimensions(DimensionsRecord::parse(data)?),
            sid::ROW => Record::Row(RowRecord::parse(data)?),
            sid::MSODRAWING => match DrawingRecord::parse(data) {
                Ok(drawing) => Record::Drawing(drawing),
                Err(e) => {
                    log::warn!("keeping undecodable MSODRAWING payload opaque: {}", e);
                    Record::Unknown {
                        sid: record_sid,
                        data: data.to_vec(),
                    }
                },
            },
            sid::WINDOW2 => Record::Window2(Window2Record::parse(data)?),
            sid::SCL => Record::Scl(SclRecord::parse(data)?),
            sid::SELECTION => Record::Selection(SelectionRecord::parse(data)?),
            sid::MERGEDCELLS => Record::MergedCells(MergedCellsRecord::parse(data)?),
            _ => Record::Unknown {
                sid: record_sid,
                data: data.to_vec(),
            },
        };
        Ok(record)
    }

    /// Encoded payload, without the 4-byte header.
    pub fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Record::Bof(r) => r.encode(&mut out),
            Record::Eof => {},
            Record::Uncalced(v)
            | Record::CalcMode(v)
            | Record::CalcCount(v)
            | Record::RefMode(v)
            | Record::Password(v)
            | Record::DefColWidth(v) => out.extend_from_slice(&v.to_le_bytes()),
            Record::Iteration(b)
            | Record::SaveRecalc(b)
            | Record::PrintHeaders(b)
            | Record::PrintGridlines(b)
            | Record::Gridset(b)
            | Record::HCenter(b)
            | Record::VCenter(b)
            | Record::Protect(b)
            | Record::ScenProtect(b)
            | Record::ObjProtect(b) => out.extend_from_slice(&b.0.to_le_bytes()),
            Record::Delta(v) => out.extend_from_slice(&v.to_le_bytes()),
            Record::Margin { inches, .. } => out.extend_from_slice(&inches.to_le_bytes()),
            Record::Guts(r) => r.encode(&mut out),
            Record::DefaultRowHeight(r) => r.encode(&mut out),
            Record::WsBool(flags) => out.extend_from_slice(&flags.bits().to_le_bytes()),
            Record::HorizontalPageBreaks(r) | Record::VerticalPageBreaks(r) => r.encode(&mut out),
            Record::Header(text) | Record::Footer(text) => {
                if let Some(text) = text {
                    text::write_unicode_string(&mut out, text);
                }
            },
            Record::Setup(r) => r.encode(&mut out),
            Record::ColumnInfo(r) => r.encode(&mut out),
            Record::Dimensions(r) => r.encode(&mut out),
            Record::Row(r) => r.encode(&mut out),
            Record::Drawing(r) => r.encode(&mut out),
            Record::Window2(r) => r.encode(&mut out),
            Record::Scl(r) => r.encode(&mut out),
            Record::Selection(r) => r.encode(&mut out),
            Record::MergedCells(r) => r.encode(&mut out),
            Record::Unknown { data, .. } => out.extend_from_slice(data),
        }
        out
    }

    /// Write header and payload; returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> SheetResult<usize> {
        let payload = self.payload();
        if payload.len() > MAX_RECORD_DATA {
            return Err(SheetError::RecordTooLarge {
                sid: self.sid(),
                len: payload.len(),
            });
        }
        write_record_header(writer, self.sid(), payload.len() as u16)?;
        writer.write_all(&payload)?;
        Ok(4 + payload.len())
    }
}

/// Decode a run of framed records in the order they appear.
pub fn read_records(data: &[u8]) -> SheetResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    while offset < data.len() {
        if data.len() - offset < 4 {
            return Err(SheetError::Truncated {
                offset,
                message: format!("{} bytes left, record header needs 4", data.len() - offset),
            });
        }
        let record_sid = binary::read_u16_le(data, offset)?;
        let len = binary::read_u16_le(data, offset + 2)? as usize;
        let start = offset + 4;
        if data.len() - start < len {
            return Err(SheetError::Truncated {
                offset,
                message: format!(
                    "{} declares {} payload bytes, {} available",
                    sid::name(record_sid),
                    len,
                    data.len() - start
                ),
            });
        }
        records.push(Record::parse(record_sid, &data[start..start + len])?);
        offset = start + len;
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(record: &Record) -> Vec<u8> {
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_header_layout() {
        let out = framed(&Record::Gridset(Flag::ON));
        assert_eq!(out, vec![0x82, 0x00, 0x02, 0x00, 0x01, 0x00]);
        assert_eq!(framed(&Record::Eof), vec![0x0A, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_known_records_decode_back() {
        let records = vec![
            Record::Bof(BofRecord::worksheet()),
            Record::Uncalced(0),
            Record::Delta(0.001),
            Record::Header(Some("&CTitle".to_string())),
            Record::Footer(None),
            Record::Margin {
                kind: MarginKind::Top,
                inches: 1.25,
            },
            Record::WsBool(WsBoolFlags::default()),
            Record::Row(RowRecord::new(12)),
            Record::Unknown {
                sid: 0x0203,
                data: vec![1, 2, 3],
            },
            Record::Eof,
        ];
        let mut bytes = Vec::new();
        for r in &records {
            r.write_to(&mut bytes).unwrap();
        }
        assert_eq!(read_records(&bytes).unwrap(), records);
    }

    #[test]
    fn test_non_canonical_payloads_write_back_unchanged() {
        let bytes: Vec<u8> = [
            // COLINFO without the trailing reserved word
            &[0x7D, 0x00, 0x0A, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x09, 0x0F, 0x00, 0x00, 0x00][..],
            // PROTECT holding 2
            &[0x12, 0x00, 0x02, 0x00, 0x02, 0x00],
            // UNCALCED with a non-zero reserved word
            &[0x5E, 0x00, 0x02, 0x00, 0x05, 0x00],
        ]
        .concat();
        let records = read_records(&bytes).unwrap();
        assert!(matches!(records[1], Record::Protect(flag) if flag.get()));
        assert_eq!(records[2], Record::Uncalced(5));

        let mut out = Vec::new();
        for record in &records {
            record.write_to(&mut out).unwrap();
        }
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_flag_set_keeps_word() {
        let mut flag = Flag(2);
        flag.set(true);
        assert_eq!(flag, Flag(2));
        flag.set(false);
        assert_eq!(flag, Flag::OFF);
        flag.set(true);
        assert_eq!(flag, Flag::ON);
    }

    #[test]
    fn test_truncated_stream() {
        let mut bytes = framed(&Record::Protect(Flag::ON));
        bytes.pop();
        assert!(matches!(
            read_records(&bytes),
            Err(SheetError::Truncated { offset: 0, .. })
        ));
        assert!(matches!(
            read_records(&[0x12, 0x00]),
            Err(SheetError::Truncated { .. })
        ));
    }

    #[test]
    fn test_bad_length_is_rejected() {
        let err = Record::parse(sid::WINDOW2, &[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            SheetError::InvalidLength {
                sid: sid::WINDOW2,
                expected: 18,
                found: 10
            }
        ));
    }

    #[test]
    fn test_bad_drawing_stays_opaque() {
        let record = Record::parse(sid::MSODRAWING, &[0x0F, 0x00, 0x02]).unwrap();
        assert_eq!(
            record,
            Record::Unknown {
                sid: sid::MSODRAWING,
                data: vec![0x0F, 0x00, 0x02]
            }
        );
    }

    #[test]
    fn test_oversized_payload() {
        let record = Record::Unknown {
            sid: 0x00FC,
            data: vec![0; MAX_RECORD_DATA + 1],
        };
        assert!(matches!(
            record.write_to(&mut Vec::new()),
            Err(SheetError::RecordTooLarge { sid: 0x00FC, .. })
        ));
    }
}
