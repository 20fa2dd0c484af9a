//! The sheet collection: named sheets sharing one drawing identifier registry.
//!
//! The workbook is the only owner of the [`DrawingRegistry`]. Every operation
//! that hands out drawing identifiers (creating a patriarch, adding a shape,
//! cloning a sheet) goes through it, so identifiers stay unique across sheets.

mod clone;
mod naming;


use crate::drawing::{ClientAnchor, DrawingRegistry};
use crate::error::{SheetError, SheetResult};
use crate::options::WorkbookOptions;
use crate::sheet::Sheet;

pub use clone::clone_sheet;
pub use naming::{MAX_SHEET_NAME_LEN, SheetNameAllocator, validate_sheet_name};

#[derive(Debug, Clone)]
struct NamedSheet {
    name: String,
    sheet: Sheet,
}

/// An ordered collection of worksheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<NamedSheet>,
    options: WorkbookOptions,
    registry: DrawingRegistry,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WorkbookOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &WorkbookOptions {
        &self.options
    }

    pub fn drawing_registry(&self) -> &DrawingRegistry {
        &self.registry
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn check_index(&self, index: usize) -> SheetResult<()> {
        if index >= self.sheets.len() {
            return Err(SheetError::out_of_range(
                "sheet",
                index as i64,
                self.sheets.len() as i64 - 1,
            ));
        }
        Ok(())
    }

    fn check_new_name(&self, name: &str, ignore: Option<usize>) -> SheetResult<()> {
        validate_sheet_name(name)?;
        let clash = self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != ignore && s.name.eq_ignore_ascii_case(name));
        if clash {
            return Err(SheetError::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, name: String, sheet: Sheet) -> usize {
        log::debug!("added sheet '{}' at index {}", name, self.sheets.len());
        self.sheets.push(NamedSheet { name, sheet });
        self.sheets.len() - 1
    }

    /// Append an empty sheet named `name`; returns its index.
    pub fn create_sheet(&mut self, name: &str) -> SheetResult<usize> {
        self.check_new_name(name, None)?;
        let sheet = Sheet::new(&self.options);
        Ok(self.push(name.to_string(), sheet))
    }

    /// Append an empty sheet named after the configured prefix and the first
    /// free number, e.g. `Sheet1`.
    pub fn create_default_sheet(&mut self) -> SheetResult<usize> {
        let prefix = self.options.sheet_name_prefix.clone();
        let name = (1u32..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|name| self.sheet_index(name).is_none())
            .ok_or_else(|| SheetError::InvalidArgument("no free sheet name".to_string()))?;
        self.create_sheet(&name)
    }

    /// Append a sheet built elsewhere, e.g. decoded from a file.
    ///
    /// Its drawing identifiers are recorded in the registry so later
    /// allocations do not collide with them. A drawing whose group is already
    /// taken by another sheet is moved to a fresh group first. On error the
    /// workbook is unchanged.
    pub fn add_sheet(&mut self, name: &str, mut sheet: Sheet) -> SheetResult<usize> {
        self.check_new_name(name, None)?;
        let loaded = sheet.drawing().and_then(|drawing| {
            let drawing_id = drawing.drawing_id()?;
            let last = drawing.last_shape_id().unwrap_or(0);
            let shapes = drawing.shape_count().unwrap_or(0);
            Some((drawing_id, last, shapes))
        });
        if let Some((drawing_id, last, shapes)) = loaded {
            if self.registry.is_registered(drawing_id) {
                let fresh = sheet.drawing_mut().renumber(&mut self.registry)?;
                log::debug!("drawing group {} already in use, moved to {}", drawing_id, fresh);
            } else {
                self.registry.register_drawing(drawing_id, last, shapes);
            }
        }
        Ok(self.push(name.to_string(), sheet))
    }

    /// Remove and return the sheet at `index`.
    ///
    /// Drawing identifiers the sheet used stay reserved.
    pub fn remove_sheet_at(&mut self, index: usize) -> SheetResult<Sheet> {
        self.check_index(index)?;
        let removed = self.sheets.remove(index);
        if removed.sheet.drawing().is_some() {
            self.registry.drawing_removed();
        }
        log::debug!("removed sheet '{}'", removed.name);
        Ok(removed.sheet)
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index).map(|s| &s.sheet)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index).map(|s| &mut s.sheet)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index(name).and_then(|i| self.sheet(i))
    }

    pub fn sheet_name(&self, index: usize) -> Option<&str> {
        self.sheets.get(index).map(|s| s.name.as_str())
    }

    /// Index of the sheet called `name`, ignoring ASCII case.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn set_sheet_name(&mut self, index: usize, name: &str) -> SheetResult<()> {
        self.check_index(index)?;
        self.check_new_name(name, Some(index))?;
        self.sheets[index].name = name.to_string();
        Ok(())
    }

    /// Copy the sheet at `index` and append the copy; returns its index.
    ///
    /// The copy is named from the source name, e.g. `"Data"` becomes
    /// `"Data (2)"`. Its drawing, if any, gets fresh identifiers. On error
    /// the workbook is unchanged.
    pub fn clone_sheet(&mut self, index: usize) -> SheetResult<usize> {
        self.check_index(index)?;
        let source = &self.sheets[index];
        let name = SheetNameAllocator::new(self.sheets.iter().map(|s| s.name.as_str()))
            .allocate(&source.name);
        let copy = clone_sheet(&source.sheet, &mut self.registry)?;
        log::debug!("cloned sheet '{}' as '{}'", source.name, name);
        Ok(self.push(name, copy))
    }

    /// Create the drawing patriarch of the sheet at `index`; returns the drawing id.
    pub fn create_drawing_patriarch(&mut self, index: usize) -> SheetResult<u32> {
        self.check_index(index)?;
        let Self {
            sheets, registry, ..
        } = self;
        sheets[index].sheet.create_drawing_patriarch(registry)
    }

    /// Add a shape to the sheet at `index`; returns the shape id.
    pub fn add_shape(
        &mut self,
        index: usize,
        shape_type: u16,
        anchor: ClientAnchor,
    ) -> SheetResult<u32> {
        self.check_index(index)?;
        let Self {
            sheets, registry, ..
        } = self;
        sheets[index].sheet.add_shape(registry, shape_type, anchor)
    }
}
