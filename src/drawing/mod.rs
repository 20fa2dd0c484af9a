//! Worksheet drawing layer.
//!
//! A sheet's drawing lives in its MSODRAWING records. The first record opens
//! the DgContainer, carries the Dg atom and the patriarch group; each later
//! record holds one shape container. Identifiers are handed out by the
//! workbook's [`DrawingRegistry`] and never chosen by callers.

pub mod escher;
pub mod registry;

use std::ops::{Deref, DerefMut};

use zerocopy::IntoBytes;
use zerocopy::byteorder::U32;

use crate::binary;
use crate::error::{SheetError, SheetResult};
use crate::records::{Record, sid};
use crate::stream::{RecordStream, find_record, find_record_mut};

use escher::{DgAtom, DrawingRecord, EscherRecord, ShapeFlags, record_type, shape_type};
pub use registry::{DggRecord, DrawingRegistry, IdCluster};

/// Cell-relative anchor of a shape (OfficeArtClientAnchorSheet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientAnchor {
    pub flags: u16,
    pub col1: u16,
    pub dx1: u16,
    pub row1: u16,
    pub dy1: u16,
    pub col2: u16,
    pub dx2: u16,
    pub row2: u16,
    pub dy2: u16,
}

impl ClientAnchor {
    pub const SIZE: usize = 18;

    /// Anchor spanning whole cells from `(col1, row1)` to `(col2, row2)`.
    pub fn new(col1: u16, row1: u16, col2: u16, row2: u16) -> Self {
        Self {
            col1,
            row1,
            col2,
            row2,
            ..Self::default()
        }
    }

    pub fn parse(data: &[u8]) -> SheetResult<Self> {
        Ok(Self {
            flags: binary::read_u16_le(data, 0)?,
            col1: binary::read_u16_le(data, 2)?,
            dx1: binary::read_u16_le(data, 4)?,
            row1: binary::read_u16_le(data, 6)?,
            dy1: binary::read_u16_le(data, 8)?,
            col2: binary::read_u16_le(data, 10)?,
            dx2: binary::read_u16_le(data, 12)?,
            row2: binary::read_u16_le(data, 14)?,
            dy2: binary::read_u16_le(data, 16)?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        for field in [
            self.flags, self.col1, self.dx1, self.row1, self.dy1, self.col2, self.dx2, self.row2,
            self.dy2,
        ] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out
    }
}

/// Summary of one shape in the drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeInfo {
    pub shape_id: u32,
    pub shape_type: u16,
    pub flags: ShapeFlags,
    pub anchor: Option<ClientAnchor>,
}

/// View over the drawing records of one sheet.
pub struct DrawingAggregate<S> {
    stream: S,
}

impl<S> DrawingAggregate<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S: Deref<Target = RecordStream>> DrawingAggregate<S> {
    fn dg(&self) -> Option<&EscherRecord> {
        find_record!(self.stream, Drawing)?.find_first(record_type::DG)
    }

    /// Whether the sheet carries a drawing patriarch.
    pub fn exists(&self) -> bool {
        self.dg().is_some()
    }

    /// Drawing group id, stored as the Dg atom instance.
    pub fn drawing_id(&self) -> Option<u32> {
        self.dg().map(|dg| dg.instance() as u32)
    }

    pub fn shape_count(&self) -> Option<u32> {
        self.dg()?.dg().map(|atom| atom.shape_count.get())
    }

    pub fn last_shape_id(&self) -> Option<u32> {
        self.dg()?.dg().map(|atom| atom.last_shape_id.get())
    }

    fn drawings(&self) -> impl Iterator<Item = &DrawingRecord> {
        self.stream.iter().filter_map(|r| match r {
            Record::Drawing(d) => Some(d),
            _ => None,
        })
    }

    /// Every shape id in record order, patriarch first.
    pub fn shape_ids(&self) -> Vec<u32> {
        self.drawings().flat_map(|d| d.shape_ids()).collect()
    }

    /// Shapes in record order, with their anchors where present.
    pub fn shapes(&self) -> Vec<ShapeInfo> {
        let mut shapes = Vec::new();
        for drawing in self.drawings() {
            for record in &drawing.records {
                record.visit(&mut |r| {
                    if r.record_id != record_type::SP_CONTAINER {
                        return;
                    }
                    let Some(sp) = r.children().iter().find_map(|c| c.sp()) else {
                        return;
                    };
                    let shape_type = r
                        .children()
                        .iter()
                        .find(|c| c.record_id == record_type::SP)
                        .map(|c| c.instance())
                        .unwrap_or(shape_type::NOT_PRIMITIVE);
                    let anchor = r
                        .children()
                        .iter()
                        .find(|c| c.record_id == record_type::CLIENT_ANCHOR)
                        .and_then(|c| ClientAnchor::parse(c.data()).ok());
                    shapes.push(ShapeInfo {
                        shape_id: sp.spid.get(),
                        shape_type,
                        flags: ShapeFlags::from_bits_retain(sp.flags.get()),
                        anchor,
                    });
                });
            }
        }
        shapes
    }

    fn has_opaque_drawing(&self) -> bool {
        self.stream
            .iter()
            .any(|r| matches!(r, Record::Unknown { sid, .. } if *sid == sid::MSODRAWING))
    }
}

impl<S: DerefMut<Target = RecordStream>> DrawingAggregate<S> {
    /// Create the drawing patriarch if the sheet has none; returns the drawing id.
    pub fn create_patriarch(&mut self, registry: &mut DrawingRegistry) -> SheetResult<u32> {
        if let Some(drawing_id) = self.drawing_id() {
            return Ok(drawing_id);
        }
        if self.has_opaque_drawing() {
            return Err(SheetError::InvalidDrawing(
                "sheet carries drawing data that could not be decoded".to_string(),
            ));
        }
        let drawing_id = registry.allocate_group_id()?;
        let spid = registry.allocate_shape_id(drawing_id)?;

        let patriarch = EscherRecord::container(
            record_type::SP_CONTAINER,
            0,
            vec![
                EscherRecord::atom(record_type::SPGR, 0x01, 0, vec![0; 16]),
                EscherRecord::shape(
                    shape_type::NOT_PRIMITIVE,
                    spid,
                    ShapeFlags::GROUP | ShapeFlags::PATRIARCH,
                ),
            ],
        );
        let dg = DgAtom {
            shape_count: U32::new(1),
            last_shape_id: U32::new(spid),
        };
        let drawing = DrawingRecord {
            records: vec![EscherRecord::container(
                record_type::DG_CONTAINER,
                0,
                vec![
                    EscherRecord::atom(record_type::DG, 0x00, drawing_id as u16, dg.as_bytes().to_vec()),
                    EscherRecord::container(record_type::SPGR_CONTAINER, 0, vec![patriarch]),
                ],
            )],
        };
        self.stream.insert_ordered(Record::Drawing(drawing));
        Ok(drawing_id)
    }

    /// Append a shape under the patriarch, creating the patriarch first if
    /// needed. Returns the new shape id.
    pub fn add_shape(
        &mut self,
        registry: &mut DrawingRegistry,
        shape_type: u16,
        anchor: ClientAnchor,
    ) -> SheetResult<u32> {
        let drawing_id = self.create_patriarch(registry)?;
        let spid = registry.allocate_shape_id(drawing_id)?;

        let shape = EscherRecord::container(
            record_type::SP_CONTAINER,
            0,
            vec![
                EscherRecord::shape(shape_type, spid, ShapeFlags::HAVE_ANCHOR | ShapeFlags::HAVE_SPT),
                EscherRecord::atom(record_type::CLIENT_ANCHOR, 0x00, 0, anchor.encode()),
                EscherRecord::atom(record_type::CLIENT_DATA, 0x00, 0, Vec::new()),
            ],
        );
        let added = shape.encoded_size() as u32;

        let first = find_record_mut!(self.stream, Drawing)
            .ok_or_else(|| SheetError::missing(sid::MSODRAWING))?;
        // The open containers declare the bytes of every later shape record.
        for container in [record_type::DG_CONTAINER, record_type::SPGR_CONTAINER] {
            if let Some(record) = first.find_first_mut(container) {
                record.length += added;
            }
        }
        if let Some(dg) = first.find_first_mut(record_type::DG)
            && let Some(mut atom) = dg.dg()
        {
            atom.shape_count = U32::new(atom.shape_count.get() + 1);
            atom.last_shape_id = U32::new(spid);
            dg.set_dg(atom);
        }

        let position = match self.stream.locate_last(sid::MSODRAWING) {
            // Keep the previous shape's OBJ/TXO records attached to it.
            Some(last) => {
                let mut end = last + 1;
                while self
                    .stream
                    .get(end)
                    .is_some_and(|r| matches!(r.sid(), sid::OBJ | sid::TXO))
                {
                    end += 1;
                }
                end
            },
            None => self.stream.position_for(sid::MSODRAWING),
        };
        self.stream.insert_at(
            position,
            Record::Drawing(DrawingRecord {
                records: vec![shape],
            }),
        )?;
        Ok(spid)
    }

    /// Move the drawing to a freshly allocated group and renumber every shape
    /// in record order. Returns the new drawing id.
    ///
    /// Capacity is checked before the registry is touched, so a failure
    /// leaves both the registry and the records unchanged.
    pub(crate) fn renumber(&mut self, registry: &mut DrawingRegistry) -> SheetResult<u32> {
        let old_id = self
            .drawing_id()
            .ok_or_else(|| SheetError::InvalidDrawing("sheet has no Dg atom".to_string()))?;
        if self.has_opaque_drawing() {
            return Err(SheetError::InvalidDrawing(
                "sheet carries drawing data that could not be decoded".to_string(),
            ));
        }
        let count = self.shape_ids().len() as u32;
        if count > DrawingRegistry::group_capacity() {
            return Err(SheetError::DrawingIdsExhausted { drawing_id: old_id });
        }

        let drawing_id = registry.allocate_group_id()?;
        let new_ids = (0..count)
            .map(|_| registry.allocate_shape_id(drawing_id))
            .collect::<SheetResult<Vec<u32>>>()?;
        let last = new_ids
            .last()
            .copied()
            .unwrap_or(drawing_id * registry::SHAPES_PER_GROUP);

        let mut ids = new_ids.into_iter();
        for record in self.stream.iter_mut() {
            let Record::Drawing(drawing) = record else {
                continue;
            };
            drawing.visit_mut(&mut |r| {
                if r.record_id == record_type::SP
                    && let Some(id) = ids.next()
                {
                    r.set_shape_id(id);
                }
            });
        }

        if let Some(first) = find_record_mut!(self.stream, Drawing)
            && let Some(dg) = first.find_first_mut(record_type::DG)
        {
            dg.set_instance(drawing_id as u16);
            if let Some(mut atom) = dg.dg() {
                atom.last_shape_id = U32::new(last);
                dg.set_dg(atom);
            }
        }
        log::debug!("renumbered drawing group {} as {}", old_id, drawing_id);
        Ok(drawing_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, Window2Record};

    fn stream() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::DefColWidth(8),
            Record::Window2(Window2Record::default()),
            Record::Eof,
        ])
    }

    #[test]
    fn test_create_patriarch_once() {
        let mut records = stream();
        let mut registry = DrawingRegistry::new();
        let mut drawing = DrawingAggregate::new(&mut records);
        assert!(!drawing.exists());
        assert_eq!(drawing.create_patriarch(&mut registry).unwrap(), 1);
        assert_eq!(drawing.create_patriarch(&mut registry).unwrap(), 1);
        assert_eq!(drawing.shape_ids(), vec![1025]);
        assert_eq!(registry.drawings_saved(), 1);
        assert_eq!(records.locate_first(sid::MSODRAWING), Some(2));
        assert_eq!(records.locate_first(sid::WINDOW2), Some(3));
    }

    #[test]
    fn test_add_shape_updates_containers() {
        let mut records = stream();
        let mut registry = DrawingRegistry::new();
        let mut drawing = DrawingAggregate::new(&mut records);
        let spid = drawing
            .add_shape(&mut registry, shape_type::RECTANGLE, ClientAnchor::new(1, 1, 3, 4))
            .unwrap();
        assert_eq!(spid, 1026);
        assert_eq!(drawing.shape_count(), Some(2));
        assert_eq!(drawing.last_shape_id(), Some(1026));

        let shapes = drawing.shapes();
        assert_eq!(shapes.len(), 2);
        assert!(shapes[0].flags.contains(ShapeFlags::PATRIARCH));
        assert_eq!(shapes[1].shape_type, shape_type::RECTANGLE);
        assert_eq!(shapes[1].anchor, Some(ClientAnchor::new(1, 1, 3, 4)));

        // Declared container length covers the shape in the second record.
        let Some(Record::Drawing(first)) = records.find_first(sid::MSODRAWING) else {
            panic!("no drawing");
        };
        let declared = first.records[0].length as usize;
        let present: usize = first.records[0].children().iter().map(|c| c.encoded_size()).sum();
        let Some(Record::Drawing(second)) = records.get(3) else {
            panic!("shape record not after the patriarch");
        };
        assert_eq!(declared, present + second.records[0].encoded_size());
    }

    #[test]
    fn test_add_shape_after_object_records() {
        let mut records = stream();
        let mut registry = DrawingRegistry::new();
        let mut drawing = DrawingAggregate::new(&mut records);
        drawing
            .add_shape(&mut registry, shape_type::RECTANGLE, ClientAnchor::default())
            .unwrap();
        let last = drawing.stream.locate_last(sid::MSODRAWING).unwrap();
        for (offset, record_sid) in [sid::OBJ, sid::TXO].into_iter().enumerate() {
            drawing
                .stream
                .insert_at(
                    last + 1 + offset,
                    Record::Unknown {
                        sid: record_sid,
                        data: vec![0; 4],
                    },
                )
                .unwrap();
        }
        drawing
            .add_shape(&mut registry, shape_type::ELLIPSE, ClientAnchor::default())
            .unwrap();

        let order: Vec<u16> = records
            .iter()
            .map(|r| r.sid())
            .filter(|s| matches!(*s, sid::MSODRAWING | sid::OBJ | sid::TXO))
            .collect();
        assert_eq!(
            order,
            vec![sid::MSODRAWING, sid::MSODRAWING, sid::OBJ, sid::TXO, sid::MSODRAWING]
        );
        assert_eq!(records.get(records.len() - 3).map(|r| r.sid()), Some(sid::MSODRAWING));
    }

    #[test]
    fn test_renumber_moves_to_new_group() {
        let mut records = stream();
        let mut registry = DrawingRegistry::new();
        let mut drawing = DrawingAggregate::new(&mut records);
        drawing
            .add_shape(&mut registry, shape_type::ELLIPSE, ClientAnchor::default())
            .unwrap();
        let before = registry.max_drawing_id();

        let new_id = drawing.renumber(&mut registry).unwrap();
        assert!(new_id > before);
        assert_eq!(drawing.drawing_id(), Some(new_id));
        assert_eq!(drawing.shape_ids(), vec![new_id * 1024 + 1, new_id * 1024 + 2]);
        assert_eq!(drawing.last_shape_id(), Some(new_id * 1024 + 2));
        assert_eq!(drawing.shape_count(), Some(2));
    }

    #[test]
    fn test_opaque_drawing_blocks_renumbering() {
        let mut records = stream();
        records
            .insert_at(
                2,
                Record::Unknown {
                    sid: sid::MSODRAWING,
                    data: vec![1, 2, 3],
                },
            )
            .unwrap();
        let mut registry = DrawingRegistry::new();
        let mut drawing = DrawingAggregate::new(&mut records);
        assert!(drawing.create_patriarch(&mut registry).is_err());
        assert_eq!(registry.max_drawing_id(), 0);
    }
}
