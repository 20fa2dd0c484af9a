//! Biffsheet - record-level model of legacy Excel (BIFF8) worksheets
//!
//! A worksheet in an `.xls` file is an ordered stream of binary records. This
//! crate keeps that stream as typed values and provides the operations that
//! must keep several co-located records consistent with each other.
//!
//! # Features
//!
//! - **Record stream**: typed records, order-preserving load and save, and
//!   placement of lazily created records at their format-mandated position
//! - **Page settings**: print setup, centering, margins, header and footer,
//!   page breaks, gridlines and zoom
//! - **Protection**: sheet, object and scenario flags with the legacy
//!   password verifier
//! - **Merged regions**: spread over as many MERGEDCELLS records as needed
//! - **Outlines**: row and column grouping with the GUTS gutter record
//! - **Drawings**: workbook-wide drawing and shape identifier allocation
//! - **Sheet cloning**: deep copies with renumbered drawing identifiers and
//!   unique sheet names
//!
//! Reading and writing the surrounding workbook container (OLE2 compound
//! file, CONTINUE splitting, cell values) is left to the caller.
//!
//! # Example
//!
//! ```
//! use biffsheet::{Workbook, drawing::ClientAnchor, drawing::escher::shape_type};
//!
//! # fn main() -> Result<(), biffsheet::SheetError> {
//! let mut workbook = Workbook::new();
//! let data = workbook.create_sheet("Data")?;
//! workbook.add_shape(data, shape_type::RECTANGLE, ClientAnchor::new(1, 1, 3, 4))?;
//! workbook.sheet_mut(data).unwrap().protect("secret");
//!
//! let copy = workbook.clone_sheet(data)?;
//! assert_eq!(workbook.sheet_name(copy), Some("Data (2)"));
//! assert_eq!(workbook.drawing_registry().max_drawing_id(), 2);
//!
//! let bytes = workbook.sheet(copy).unwrap().to_bytes()?;
//! assert!(!bytes.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod drawing;
pub mod error;
pub mod options;
pub mod records;
pub mod sheet;
pub mod stream;
pub mod workbook;

pub use drawing::DrawingRegistry;
pub use error::{SheetError, SheetResult};
pub use options::WorkbookOptions;
pub use records::Record;
pub use sheet::Sheet;
pub use stream::RecordStream;
pub use workbook::Workbook;
