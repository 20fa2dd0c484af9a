//! Deep sheet copy with drawing identifier renumbering.

use crate::drawing::DrawingRegistry;
use crate::error::SheetResult;
use crate::sheet::Sheet;

/// Copy `source` into a sheet that shares no storage with it.
///
/// Runs in two passes. The first copies every record by value. The second
/// runs only when the source has a drawing: the copy is moved to a newly
/// allocated drawing group and every shape id is renumbered in record order,
/// so parent/child structure is kept. Nothing else is renumbered.
///
/// On error the registry has not handed out any identifiers and no sheet is
/// returned.
pub fn clone_sheet(source: &Sheet, registry: &mut DrawingRegistry) -> SheetResult<Sheet> {
    let mut copy = source.clone();
    if copy.drawing().is_some() {
        let drawing_id = copy.drawing_mut().renumber(registry)?;
        log::debug!("cloned sheet drawing into group {}", drawing_id);
    }
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::ClientAnchor;
    use crate::drawing::escher::shape_type;
    use crate::options::WorkbookOptions;

    #[test]
    fn test_clone_without_drawing_leaves_registry() {
        let mut registry = DrawingRegistry::new();
        let source = Sheet::new(&WorkbookOptions::default());
        let copy = clone_sheet(&source, &mut registry).unwrap();
        assert_eq!(copy, source);
        assert_eq!(registry, DrawingRegistry::new());
    }

    #[test]
    fn test_clone_renumbers_drawing() {
        let mut registry = DrawingRegistry::new();
        let mut source = Sheet::new(&WorkbookOptions::default());
        source
            .drawing_mut()
            .add_shape(&mut registry, shape_type::RECTANGLE, ClientAnchor::new(0, 0, 2, 2))
            .unwrap();
        let before = registry.max_drawing_id();

        let copy = clone_sheet(&source, &mut registry).unwrap();
        let copied = copy.drawing().unwrap();
        assert_eq!(copied.drawing_id(), Some(before + 1));
        assert_eq!(registry.max_drawing_id(), before + 1);
        assert_eq!(registry.drawings_saved(), 2);

        let original = source.drawing().unwrap();
        assert_eq!(original.drawing_id(), Some(before));
        assert_eq!(original.shape_ids(), vec![1025, 1026]);
        assert_eq!(copied.shape_ids(), vec![2049, 2050]);
    }
}
