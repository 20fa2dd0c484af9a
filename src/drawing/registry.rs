//! Workbook-wide allocator for drawing group and shape identifiers.
//!
//! Every drawing group owns a block of 1024 shape identifiers: group `g`
//! hands out `g * 1024 + 1 ..= g * 1024 + 1023`. Identifiers only ever grow
//! and are never returned to the pool, not even when the sheet that used them
//! is removed.

use std::collections::BTreeMap;

use crate::binary;
use crate::error::{SheetError, SheetResult};

use super::escher::{EscherRecord, record_type};

/// Shape identifiers reserved per drawing group.
pub const SHAPES_PER_GROUP: u32 = 1024;

/// Highest drawing group a Dg atom instance (12 bits) can name.
pub const MAX_DRAWING_ID: u32 = 0x0FFF;

/// Identifier state shared by all sheets of a workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawingRegistry {
    max_drawing_id: u32,
    /// Last shape id handed out, per drawing group
    last_shape_ids: BTreeMap<u32, u32>,
    shapes_saved: u32,
    drawings_saved: u32,
}

impl DrawingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First shape id of `drawing_id`'s block, minus one.
    fn block_base(drawing_id: u32) -> u32 {
        drawing_id * SHAPES_PER_GROUP
    }

    /// Highest drawing group id allocated so far (0 when none).
    pub fn max_drawing_id(&self) -> u32 {
        self.max_drawing_id
    }

    pub fn last_shape_id(&self, drawing_id: u32) -> Option<u32> {
        self.last_shape_ids.get(&drawing_id).copied()
    }

    /// Whether `drawing_id` is already allocated or registered.
    pub fn is_registered(&self, drawing_id: u32) -> bool {
        self.last_shape_ids.contains_key(&drawing_id)
    }

    /// Highest shape id handed out in any group.
    pub fn max_shape_id(&self) -> u32 {
        self.last_shape_ids.values().copied().max().unwrap_or(0)
    }

    pub fn shapes_saved(&self) -> u32 {
        self.shapes_saved
    }

    /// Number of drawing groups currently stored in the workbook.
    pub fn drawings_saved(&self) -> u32 {
        self.drawings_saved
    }

    /// Allocate a fresh drawing group, one above the current maximum.
    pub fn allocate_group_id(&mut self) -> SheetResult<u32> {
        let drawing_id = self.max_drawing_id + 1;
        if drawing_id > MAX_DRAWING_ID {
            return Err(SheetError::out_of_range(
                "drawing group",
                drawing_id,
                MAX_DRAWING_ID,
            ));
        }
        self.max_drawing_id = drawing_id;
        self.last_shape_ids
            .insert(drawing_id, Self::block_base(drawing_id));
        self.drawings_saved += 1;
        log::debug!("allocated drawing group {}", drawing_id);
        Ok(drawing_id)
    }

    /// Allocate the next shape id inside `drawing_id`'s block.
    pub fn allocate_shape_id(&mut self, drawing_id: u32) -> SheetResult<u32> {
        let last = self.last_shape_ids.get(&drawing_id).copied().ok_or_else(|| {
            SheetError::InvalidArgument(format!("drawing group {} was never allocated", drawing_id))
        })?;
        let spid = last + 1;
        if spid > Self::block_base(drawing_id) + SHAPES_PER_GROUP - 1 {
            return Err(SheetError::DrawingIdsExhausted { drawing_id });
        }
        self.last_shape_ids.insert(drawing_id, spid);
        self.shapes_saved += 1;
        log::debug!("allocated shape {} in drawing group {}", spid, drawing_id);
        Ok(spid)
    }

    /// Shape ids still free in a freshly allocated group.
    pub fn group_capacity() -> u32 {
        SHAPES_PER_GROUP - 1
    }

    /// Account for a drawing that already carries identifiers, e.g. a sheet
    /// read from a file.
    pub(crate) fn register_drawing(&mut self, drawing_id: u32, last_shape_id: u32, shapes: u32) {
        self.max_drawing_id = self.max_drawing_id.max(drawing_id);
        let last = self
            .last_shape_ids
            .entry(drawing_id)
            .or_insert(Self::block_base(drawing_id));
        *last = (*last).max(last_shape_id);
        self.shapes_saved += shapes;
        self.drawings_saved += 1;
        log::debug!(
            "registered drawing group {} (last shape {})",
            drawing_id,
            last_shape_id
        );
    }

    /// A sheet holding a drawing left the workbook. Its ids stay reserved.
    pub(crate) fn drawing_removed(&mut self) {
        self.drawings_saved = self.drawings_saved.saturating_sub(1);
    }

    pub fn from_dgg(dgg: &DggRecord) -> Self {
        let mut registry = Self {
            shapes_saved: dgg.shapes_saved,
            drawings_saved: dgg.drawings_saved,
            ..Self::default()
        };
        for cluster in &dgg.clusters {
            registry.max_drawing_id = registry.max_drawing_id.max(cluster.drawing_id);
            let last = Self::block_base(cluster.drawing_id) + cluster.shapes_used;
            let entry = registry
                .last_shape_ids
                .entry(cluster.drawing_id)
                .or_insert(last);
            *entry = (*entry).max(last);
        }
        registry
    }

    pub fn to_dgg(&self) -> DggRecord {
        DggRecord {
            max_shape_id: self.max_shape_id(),
            shapes_saved: self.shapes_saved,
            drawings_saved: self.drawings_saved,
            clusters: self
                .last_shape_ids
                .iter()
                .map(|(&drawing_id, &last)| IdCluster {
                    drawing_id,
                    shapes_used: last - Self::block_base(drawing_id),
                })
                .collect(),
        }
    }
}

/// One FIDCL entry of the DGG atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCluster {
    pub drawing_id: u32,
    pub shapes_used: u32,
}

/// DGG atom (0xF006), the workbook-level drawing group record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DggRecord {
    pub max_shape_id: u32,
    pub shapes_saved: u32,
    pub drawings_saved: u32,
    pub clusters: Vec<IdCluster>,
}

impl DggRecord {
    pub fn parse(data: &[u8]) -> SheetResult<Self> {
        let max_shape_id = binary::read_u32_le(data, 0)?;
        // Stored as the number of clusters plus one.
        let cluster_count = binary::read_u32_le(data, 4)?.saturating_sub(1) as usize;
        let shapes_saved = binary::read_u32_le(data, 8)?;
        let drawings_saved = binary::read_u32_le(data, 12)?;
        let mut clusters = Vec::with_capacity(cluster_count.min(data.len() / 8));
        for i in 0..cluster_count {
            let offset = 16 + i * 8;
            clusters.push(IdCluster {
                drawing_id: binary::read_u32_le(data, offset)?,
                shapes_used: binary::read_u32_le(data, offset + 4)?,
            });
        }
        Ok(Self {
            max_shape_id,
            shapes_saved,
            drawings_saved,
            clusters,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.clusters.len() * 8);
        out.extend_from_slice(&self.max_shape_id.to_le_bytes());
        out.extend_from_slice(&(self.clusters.len() as u32 + 1).to_le_bytes());
        out.extend_from_slice(&self.shapes_saved.to_le_bytes());
        out.extend_from_slice(&self.drawings_saved.to_le_bytes());
        for cluster in &self.clusters {
            out.extend_from_slice(&cluster.drawing_id.to_le_bytes());
            out.extend_from_slice(&cluster.shapes_used.to_le_bytes());
        }
        out
    }

    pub fn to_escher(&self) -> EscherRecord {
        EscherRecord::atom(record_type::DGG, 0x00, 0, self.encode())
    }

    pub fn from_escher(record: &EscherRecord) -> SheetResult<Self> {
        if record.record_id != record_type::DGG {
            return Err(SheetError::InvalidDrawing(format!(
                "expected DGG atom, found 0x{:04X}",
                record.record_id
            )));
        }
        Self::parse(record.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_ids_are_monotonic() {
        let mut registry = DrawingRegistry::new();
        assert_eq!(registry.allocate_group_id().unwrap(), 1);
        assert_eq!(registry.allocate_group_id().unwrap(), 2);
        assert_eq!(registry.max_drawing_id(), 2);
        assert_eq!(registry.drawings_saved(), 2);
    }

    #[test]
    fn test_shape_ids_stay_in_block() {
        let mut registry = DrawingRegistry::new();
        let g = registry.allocate_group_id().unwrap();
        assert_eq!(registry.allocate_shape_id(g).unwrap(), 1025);
        assert_eq!(registry.allocate_shape_id(g).unwrap(), 1026);
        for _ in 2..DrawingRegistry::group_capacity() {
            registry.allocate_shape_id(g).unwrap();
        }
        assert_eq!(registry.last_shape_id(g), Some(2047));
        assert!(matches!(
            registry.allocate_shape_id(g),
            Err(SheetError::DrawingIdsExhausted { drawing_id: 1 })
        ));
        assert!(registry.allocate_shape_id(9).is_err());
    }

    #[test]
    fn test_removal_does_not_release_ids() {
        let mut registry = DrawingRegistry::new();
        registry.allocate_group_id().unwrap();
        registry.drawing_removed();
        assert_eq!(registry.drawings_saved(), 0);
        assert_eq!(registry.allocate_group_id().unwrap(), 2);
    }

    #[test]
    fn test_register_loaded_drawing() {
        let mut registry = DrawingRegistry::new();
        registry.register_drawing(3, 3 * 1024 + 5, 5);
        assert_eq!(registry.max_drawing_id(), 3);
        assert!(registry.is_registered(3));
        assert!(!registry.is_registered(1));
        assert_eq!(registry.allocate_group_id().unwrap(), 4);
        assert_eq!(registry.allocate_shape_id(3).unwrap(), 3 * 1024 + 6);
    }

    #[test]
    fn test_dgg_conversion() {
        let mut registry = DrawingRegistry::new();
        let g = registry.allocate_group_id().unwrap();
        registry.allocate_shape_id(g).unwrap();
        registry.allocate_shape_id(g).unwrap();
        let dgg = registry.to_dgg();
        assert_eq!(dgg.max_shape_id, 1026);
        assert_eq!(dgg.clusters, vec![IdCluster { drawing_id: 1, shapes_used: 2 }]);

        let encoded = dgg.encode();
        assert_eq!(&encoded[4..8], &2u32.to_le_bytes());
        let escher = dgg.to_escher();
        let parsed = DggRecord::from_escher(&escher).unwrap();
        assert_eq!(parsed, dgg);
        assert_eq!(DrawingRegistry::from_dgg(&parsed), registry);
    }
}
