//! Owned Escher (OfficeArt) record tree carried by MSODRAWING records.
//!
//! Based on MS-ODRAW. A record starts with an 8-byte header:
//!
//! - Bytes 0-1: Version (4 bits) | Instance (12 bits)
//! - Bytes 2-3: Record Type
//! - Bytes 4-7: Record Length (32-bit)
//!
//! Version 0xF marks a container whose body is a sequence of child records.
//! In a worksheet the drawing containers opened in the first MSODRAWING record
//! declare lengths that cover data continued in later MSODRAWING records, so a
//! container keeps its declared length instead of recomputing it from the
//! children present in this record.

use bitflags::bitflags;
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::*;

use crate::error::{SheetError, SheetResult};

bitflags! {
    /// Shape flags for the Sp atom (MS-ODRAW 2.2.40)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShapeFlags: u32 {
        /// Shape is a group
        const GROUP = 0x0001;
        /// Shape is a child of a group
        const CHILD = 0x0002;
        /// Shape is the topmost group (patriarch)
        const PATRIARCH = 0x0004;
        /// Shape has been deleted
        const DELETED = 0x0008;
        /// Shape is an OLE object
        const OLE_SHAPE = 0x0010;
        /// Shape has a valid master
        const HAVE_MASTER = 0x0020;
        /// Shape is flipped horizontally
        const FLIP_H = 0x0040;
        /// Shape is flipped vertically
        const FLIP_V = 0x0080;
        /// Shape is a connector
        const CONNECTOR = 0x0100;
        /// Shape has an anchor
        const HAVE_ANCHOR = 0x0200;
        /// Shape is a background shape
        const BACKGROUND = 0x0400;
        /// Shape has a shape type property
        const HAVE_SPT = 0x0800;
    }
}

pub mod record_type {
    pub const DGG_CONTAINER: u16 = 0xF000;
    pub const DG_CONTAINER: u16 = 0xF002;
    pub const SPGR_CONTAINER: u16 = 0xF003;
    pub const SP_CONTAINER: u16 = 0xF004;
    pub const DGG: u16 = 0xF006;
    pub const DG: u16 = 0xF008;
    pub const SPGR: u16 = 0xF009;
    pub const SP: u16 = 0xF00A;
    pub const OPT: u16 = 0xF00B;
    pub const CLIENT_TEXTBOX: u16 = 0xF00D;
    pub const CHILD_ANCHOR: u16 = 0xF00F;
    pub const CLIENT_ANCHOR: u16 = 0xF010;
    pub const CLIENT_DATA: u16 = 0xF011;
}

pub mod shape_type {
    pub const NOT_PRIMITIVE: u16 = 0;
    pub const RECTANGLE: u16 = 1;
    pub const ELLIPSE: u16 = 3;
    pub const LINE: u16 = 20;
    pub const PICTURE_FRAME: u16 = 75;
    pub const HOST_CONTROL: u16 = 201;
    pub const TEXT_BOX: u16 = 202;
}

/// Escher record header (8 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct EscherRecordHeader {
    pub ver_inst: U16<LittleEndian>,
    pub rec_type: U16<LittleEndian>,
    pub length: U32<LittleEndian>,
}

impl EscherRecordHeader {
    pub const SIZE: usize = 8;

    pub fn new(options: u16, rec_type: u16, length: u32) -> Self {
        Self {
            ver_inst: U16::new(options),
            rec_type: U16::new(rec_type),
            length: U32::new(length),
        }
    }
}

/// Sp atom payload (8 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct SpAtom {
    pub spid: U32<LittleEndian>,
    pub flags: U32<LittleEndian>,
}

/// Dg atom payload (8 bytes)
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct DgAtom {
    pub shape_count: U32<LittleEndian>,
    pub last_shape_id: U32<LittleEndian>,
}

/// Body of an Escher record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscherBody {
    Children(Vec<EscherRecord>),
    Data(Vec<u8>),
}

/// One Escher record with an owned body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscherRecord {
    /// Packed version (low 4 bits) and instance (high 12 bits)
    pub options: u16,
    pub record_id: u16,
    /// Declared body length
    pub length: u32,
    pub body: EscherBody,
}

#[inline]
fn pack_options(version: u8, instance: u16) -> u16 {
    (version as u16 & 0x0F) | ((instance & 0x0FFF) << 4)
}

impl EscherRecord {
    /// Container whose declared length covers exactly `children`.
    pub fn container(record_id: u16, instance: u16, children: Vec<EscherRecord>) -> Self {
        let length = children.iter().map(|c| c.encoded_size()).sum::<usize>() as u32;
        Self {
            options: pack_options(0x0F, instance),
            record_id,
            length,
            body: EscherBody::Children(children),
        }
    }

    pub fn atom(record_id: u16, version: u8, instance: u16, data: Vec<u8>) -> Self {
        Self {
            options: pack_options(version, instance),
            record_id,
            length: data.len() as u32,
            body: EscherBody::Data(data),
        }
    }

    /// Sp atom for `shape_type` with the given identifier and flags.
    pub fn shape(shape_type: u16, spid: u32, flags: ShapeFlags) -> Self {
        let sp = SpAtom {
            spid: U32::new(spid),
            flags: U32::new(flags.bits()),
        };
        Self::atom(record_type::SP, 0x02, shape_type, sp.as_bytes().to_vec())
    }

    pub fn version(&self) -> u8 {
        (self.options & 0x000F) as u8
    }

    pub fn instance(&self) -> u16 {
        (self.options >> 4) & 0x0FFF
    }

    pub fn set_instance(&mut self, instance: u16) {
        self.options = pack_options(self.version(), instance);
    }

    pub fn is_container(&self) -> bool {
        matches!(self.body, EscherBody::Children(_))
    }

    pub fn children(&self) -> &[EscherRecord] {
        match &self.body {
            EscherBody::Children(children) => children,
            EscherBody::Data(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<EscherRecord>> {
        match &mut self.body {
            EscherBody::Children(children) => Some(children),
            EscherBody::Data(_) => None,
        }
    }

    pub fn data(&self) -> &[u8] {
        match &self.body {
            EscherBody::Data(data) => data,
            EscherBody::Children(_) => &[],
        }
    }

    /// Bytes this record occupies in the current MSODRAWING payload.
    pub fn encoded_size(&self) -> usize {
        EscherRecordHeader::SIZE
            + match &self.body {
                EscherBody::Children(children) => {
                    children.iter().map(|c| c.encoded_size()).sum::<usize>()
                },
                EscherBody::Data(data) => data.len(),
            }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        let header = EscherRecordHeader::new(self.options, self.record_id, self.length);
        out.extend_from_slice(header.as_bytes());
        match &self.body {
            EscherBody::Children(children) => {
                for child in children {
                    child.write_to(out);
                }
            },
            EscherBody::Data(data) => out.extend_from_slice(data),
        }
    }

    /// First record with `record_id` in depth-first order, including `self`.
    pub fn find_first(&self, record_id: u16) -> Option<&EscherRecord> {
        if self.record_id == record_id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find_first(record_id))
    }

    pub fn find_first_mut(&mut self, record_id: u16) -> Option<&mut EscherRecord> {
        if self.record_id == record_id {
            return Some(self);
        }
        match &mut self.body {
            EscherBody::Children(children) => {
                children.iter_mut().find_map(|c| c.find_first_mut(record_id))
            },
            EscherBody::Data(_) => None,
        }
    }

    /// Visit this record and all descendants in depth-first order.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a EscherRecord)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut EscherRecord)) {
        f(self);
        if let EscherBody::Children(children) = &mut self.body {
            for child in children {
                child.visit_mut(f);
            }
        }
    }

    /// Decoded Sp atom, if this is one.
    pub fn sp(&self) -> Option<SpAtom> {
        if self.record_id != record_type::SP {
            return None;
        }
        SpAtom::read_from_prefix(self.data()).ok().map(|(sp, _)| sp)
    }

    pub fn set_shape_id(&mut self, spid: u32) -> bool {
        if self.record_id != record_type::SP {
            return false;
        }
        match &mut self.body {
            EscherBody::Data(data) if data.len() >= 4 => {
                data[..4].copy_from_slice(&spid.to_le_bytes());
                true
            },
            _ => false,
        }
    }

    /// Decoded Dg atom, if this is one.
    pub fn dg(&self) -> Option<DgAtom> {
        if self.record_id != record_type::DG {
            return None;
        }
        DgAtom::read_from_prefix(self.data()).ok().map(|(dg, _)| dg)
    }

    pub fn set_dg(&mut self, dg: DgAtom) -> bool {
        if self.record_id != record_type::DG {
            return false;
        }
        match &mut self.body {
            EscherBody::Data(data) if data.len() >= 8 => {
                data[..8].copy_from_slice(dg.as_bytes());
                true
            },
            _ => false,
        }
    }
}

/// Parse the sequence of Escher records in `data`.
///
/// A container whose declared length runs past the end of `data` is taken to
/// continue in a later MSODRAWING record; its children are read up to the end
/// of the available bytes.
pub fn parse_escher_records(data: &[u8]) -> SheetResult<Vec<EscherRecord>> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    while offset < data.len() {
        let (header, _) = EscherRecordHeader::read_from_prefix(&data[offset..]).map_err(|_| {
            SheetError::InvalidDrawing(format!(
                "{} trailing bytes at offset {} do not form a header",
                data.len() - offset,
                offset
            ))
        })?;
        let options = header.ver_inst.get();
        let record_id = header.rec_type.get();
        let length = header.length.get();
        let body_start = offset + EscherRecordHeader::SIZE;
        let available = data.len() - body_start;

        if options & 0x000F == 0x000F {
            let body_len = (length as usize).min(available);
            let children = parse_escher_records(&data[body_start..body_start + body_len])?;
            records.push(EscherRecord {
                options,
                record_id,
                length,
                body: EscherBody::Children(children),
            });
            offset = body_start + body_len;
        } else {
            if length as usize > available {
                return Err(SheetError::InvalidDrawing(format!(
                    "atom 0x{:04X} declares {} bytes but only {} remain",
                    record_id, length, available
                )));
            }
            let body = data[body_start..body_start + length as usize].to_vec();
            records.push(EscherRecord {
                options,
                record_id,
                length,
                body: EscherBody::Data(body),
            });
            offset = body_start + length as usize;
        }
    }
    Ok(records)
}

/// Payload of one MSODRAWING record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawingRecord {
    pub records: Vec<EscherRecord>,
}

impl DrawingRecord {
    pub fn parse(data: &[u8]) -> SheetResult<Self> {
        Ok(Self {
            records: parse_escher_records(data)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        for record in &self.records {
            record.write_to(out);
        }
    }

    pub fn find_first(&self, record_id: u16) -> Option<&EscherRecord> {
        self.records.iter().find_map(|r| r.find_first(record_id))
    }

    pub fn find_first_mut(&mut self, record_id: u16) -> Option<&mut EscherRecord> {
        self.records
            .iter_mut()
            .find_map(|r| r.find_first_mut(record_id))
    }

    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut EscherRecord)) {
        for record in &mut self.records {
            record.visit_mut(f);
        }
    }

    /// Shape identifiers of every Sp atom, in depth-first order.
    pub fn shape_ids(&self) -> Vec<u32> {
        let mut ids = Vec::new();
        for record in &self.records {
            record.visit(&mut |r| {
                if let Some(sp) = r.sp() {
                    ids.push(sp.spid.get());
                }
            });
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_drawing() -> DrawingRecord {
        let patriarch = EscherRecord::container(
            record_type::SP_CONTAINER,
            0,
            vec![
                EscherRecord::atom(record_type::SPGR, 0x01, 0, vec![0; 16]),
                EscherRecord::shape(
                    shape_type::NOT_PRIMITIVE,
                    1025,
                    ShapeFlags::GROUP | ShapeFlags::PATRIARCH,
                ),
            ],
        );
        let dg = DgAtom {
            shape_count: U32::new(1),
            last_shape_id: U32::new(1025),
        };
        DrawingRecord {
            records: vec![EscherRecord::container(
                record_type::DG_CONTAINER,
                0,
                vec![
                    EscherRecord::atom(record_type::DG, 0x00, 1, dg.as_bytes().to_vec()),
                    EscherRecord::container(record_type::SPGR_CONTAINER, 0, vec![patriarch]),
                ],
            )],
        }
    }

    #[test]
    fn test_header_packing() {
        let record = EscherRecord::atom(record_type::DG, 0x00, 3, vec![0; 8]);
        assert_eq!(record.instance(), 3);
        assert_eq!(record.version(), 0);
        let mut out = Vec::new();
        record.write_to(&mut out);
        assert_eq!(&out[0..4], &[0x30, 0x00, 0x08, 0xF0]);
        assert_eq!(&out[4..8], &[8, 0, 0, 0]);
    }

    #[test]
    fn test_parse_encode_identity() {
        let drawing = sample_drawing();
        let mut out = Vec::new();
        drawing.encode(&mut out);
        let parsed = DrawingRecord::parse(&out).unwrap();
        assert_eq!(parsed, drawing);
        assert_eq!(parsed.shape_ids(), vec![1025]);
        assert_eq!(parsed.find_first(record_type::DG).unwrap().instance(), 1);
    }

    #[test]
    fn test_open_container_keeps_declared_length() {
        let mut out = Vec::new();
        sample_drawing().encode(&mut out);
        // Pretend the DgContainer continues in a later record.
        let declared = u32::from_le_bytes([out[4], out[5], out[6], out[7]]) + 40;
        out[4..8].copy_from_slice(&declared.to_le_bytes());
        let parsed = DrawingRecord::parse(&out).unwrap();
        assert_eq!(parsed.records[0].length, declared);
        let mut again = Vec::new();
        parsed.encode(&mut again);
        assert_eq!(again, out);
    }

    #[test]
    fn test_truncated_atom_is_rejected() {
        let mut out = Vec::new();
        EscherRecord::atom(record_type::SP, 0x02, 0, vec![0; 8]).write_to(&mut out);
        out.truncate(12);
        assert!(DrawingRecord::parse(&out).is_err());
    }

    #[test]
    fn test_rewrite_ids() {
        let mut drawing = sample_drawing();
        drawing.visit_mut(&mut |r| {
            if let Some(sp) = r.sp() {
                r.set_shape_id(sp.spid.get() + 1024);
            }
        });
        assert_eq!(drawing.shape_ids(), vec![2049]);
        let dg = drawing.find_first_mut(record_type::DG).unwrap();
        dg.set_instance(2);
        assert_eq!(dg.instance(), 2);
        assert_eq!(dg.dg().unwrap().last_shape_id.get(), 1025);
    }
}
