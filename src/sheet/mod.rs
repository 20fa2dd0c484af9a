//! A single worksheet as an ordered sequence of typed records.
//!
//! [`Sheet`] owns a [`RecordStream`] and exposes the structural operations
//! that keep its co-located records consistent. Groups of related records are
//! reached through borrowed views:
//!
//! - [`PageSettings`]: print setup, centering, margins, page breaks, zoom
//! - [`ProtectionAggregate`]: PROTECT / OBJPROTECT / SCENPROTECT / PASSWORD
//! - [`MergedRegionTable`]: MERGEDCELLS
//! - [`Outline`]: row and column grouping with the GUTS record
//! - [`DrawingAggregate`]: the MSODRAWING records
//!
//! Each view comes in a shared form for reading and a mutable form for
//! writing, e.g. [`Sheet::page_settings`] and [`Sheet::page_settings_mut`].
//!
//! # Examples
//!
//! ```
//! use biffsheet::sheet::Sheet;
//! use biffsheet::options::WorkbookOptions;
//!
//! let mut sheet = Sheet::new(&WorkbookOptions::default());
//! sheet.group_rows(1, 4)?;
//! sheet.page_settings_mut().set_zoom(3, 4)?;
//!
//! let bytes = sheet.to_bytes()?;
//! let loaded = Sheet::from_bytes(&bytes)?;
//! assert_eq!(loaded.outline().row_level(2), 1);
//! # Ok::<(), biffsheet::error::SheetError>(())
//! ```

mod columns;
mod merged;
mod outline;
mod page_settings;
mod protection;
mod rows;


use std::io::Write;

use crate::drawing::{ClientAnchor, DrawingAggregate, DrawingRegistry};
use crate::error::{SheetError, SheetResult};
use crate::options::WorkbookOptions;
use crate::records::{
    BofRecord, CellRangeAddress, DefaultRowHeightRecord, DimensionsRecord, Flag, GutsRecord, MAX_ROW,
    PrintSetupRecord, Record, RowRecord, SelectionRecord, Window2Flags, Window2Record,
    WsBoolFlags, read_records, sid,
};
use crate::stream::{RecordStream, find_record, find_record_mut};

pub use columns::MAX_COLUMN_WIDTH;
pub use merged::MergedRegionTable;
pub use outline::Outline;
pub use page_settings::PageSettings;
pub use protection::{ProtectionAggregate, ProtectionState, password_hash};

/// One worksheet.
///
/// Cloning a sheet copies every record; the copy shares nothing with the
/// original. Use [`Workbook::clone_sheet`](crate::workbook::Workbook::clone_sheet)
/// to also move a drawing to fresh identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    records: RecordStream,
}

macro_rules! wsbool_flag {
    ($(#[$doc:meta])* $get:ident, $set:ident, $flag:ident) => {
        $(#[$doc])*
        pub fn $get(&self) -> SheetResult<bool> {
            Ok(self.ws_bool()?.contains(WsBoolFlags::$flag))
        }

        pub fn $set(&mut self, value: bool) -> SheetResult<()> {
            self.set_ws_bool_flag(WsBoolFlags::$flag, value)
        }
    };
}

macro_rules! window_flag {
    ($get:ident, $set:ident, $flag:ident) => {
        pub fn $get(&self) -> SheetResult<bool> {
            Ok(self.window2()?.options.contains(Window2Flags::$flag))
        }

        pub fn $set(&mut self, value: bool) -> SheetResult<()> {
            self.window2_mut()?.options.set(Window2Flags::$flag, value);
            Ok(())
        }
    };
}

impl Sheet {
    /// Empty worksheet with the minimal record set Excel expects.
    pub fn new(options: &WorkbookOptions) -> Self {
        let records = vec![
            Record::Bof(BofRecord::worksheet()),
            Record::CalcMode(1),
            Record::CalcCount(100),
            Record::RefMode(1),
            Record::Iteration(Flag::OFF),
            Record::Delta(0.001),
            Record::SaveRecalc(Flag::ON),
            Record::PrintHeaders(Flag::OFF),
            Record::PrintGridlines(Flag::OFF),
            Record::Gridset(Flag::ON),
            Record::Guts(GutsRecord::default()),
            Record::DefaultRowHeight(DefaultRowHeightRecord {
                options: 0,
                height: options.default_row_height,
            }),
            Record::WsBool(WsBoolFlags::default()),
            Record::Header(None),
            Record::Footer(None),
            Record::HCenter(Flag::OFF),
            Record::VCenter(Flag::OFF),
            Record::Setup(PrintSetupRecord::default()),
            Record::Protect(Flag::OFF),
            Record::DefColWidth(options.default_column_width),
            Record::Dimensions(DimensionsRecord::default()),
            Record::Window2(Window2Record::default()),
            Record::Selection(SelectionRecord::default()),
            Record::Eof,
        ];
        Self {
            records: RecordStream::from_records(records),
        }
    }

    /// Wrap records supplied by the container layer, in the order given.
    ///
    /// Only the BOF and EOF framing is checked here; other required records
    /// are reported when an operation needs them.
    pub fn from_records(records: Vec<Record>) -> SheetResult<Self> {
        let records = RecordStream::from_records(records);
        records.require(sid::BOF)?;
        records.require(sid::EOF)?;
        Ok(Self { records })
    }

    /// Decode a worksheet substream.
    pub fn from_bytes(data: &[u8]) -> SheetResult<Self> {
        Self::from_records(read_records(data)?)
    }

    /// Serialize in record order; returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> SheetResult<usize> {
        self.records.write_to(writer)
    }

    pub fn to_bytes(&self) -> SheetResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn records(&self) -> &RecordStream {
        &self.records
    }

    /// Direct access to the record sequence. Callers must keep the
    /// adjacency rules themselves.
    pub fn records_mut(&mut self) -> &mut RecordStream {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records.into_records()
    }

    // ===== Views =====

    pub fn page_settings(&self) -> PageSettings<&RecordStream> {
        PageSettings::new(&self.records)
    }

    pub fn page_settings_mut(&mut self) -> PageSettings<&mut RecordStream> {
        PageSettings::new(&mut self.records)
    }

    pub fn sheet_protection(&self) -> ProtectionAggregate<&RecordStream> {
        ProtectionAggregate::new(&self.records)
    }

    pub fn sheet_protection_mut(&mut self) -> ProtectionAggregate<&mut RecordStream> {
        ProtectionAggregate::new(&mut self.records)
    }

    pub fn merged_regions(&self) -> MergedRegionTable<&RecordStream> {
        MergedRegionTable::new(&self.records)
    }

    pub fn merged_regions_mut(&mut self) -> MergedRegionTable<&mut RecordStream> {
        MergedRegionTable::new(&mut self.records)
    }

    pub fn outline(&self) -> Outline<&RecordStream> {
        Outline::new(&self.records)
    }

    pub fn outline_mut(&mut self) -> Outline<&mut RecordStream> {
        Outline::new(&mut self.records)
    }

    /// The drawing, absent when the sheet has no patriarch.
    pub fn drawing(&self) -> Option<DrawingAggregate<&RecordStream>> {
        let drawing = DrawingAggregate::new(&self.records);
        drawing.exists().then_some(drawing)
    }

    pub fn drawing_mut(&mut self) -> DrawingAggregate<&mut RecordStream> {
        DrawingAggregate::new(&mut self.records)
    }

    /// Create the drawing patriarch if missing; returns the drawing id.
    pub fn create_drawing_patriarch(&mut self, registry: &mut DrawingRegistry) -> SheetResult<u32> {
        self.drawing_mut().create_patriarch(registry)
    }

    /// Add a shape anchored at `anchor`; returns its shape id.
    pub fn add_shape(
        &mut self,
        registry: &mut DrawingRegistry,
        shape_type: u16,
        anchor: ClientAnchor,
    ) -> SheetResult<u32> {
        self.drawing_mut().add_shape(registry, shape_type, anchor)
    }

    // ===== Protection =====

    pub fn protect(&mut self, password: &str) {
        self.sheet_protection_mut().protect(password);
    }

    pub fn unprotect(&mut self) {
        self.sheet_protection_mut().unprotect();
    }

    pub fn set_protect(&mut self, value: bool) {
        self.sheet_protection_mut().set_protect(value);
    }

    pub fn protection(&self) -> ProtectionState {
        self.sheet_protection().state()
    }

    pub fn password_hash(&self) -> Option<u16> {
        self.sheet_protection().password_hash()
    }

    // ===== Merged regions =====

    pub fn add_merged_region(&mut self, region: CellRangeAddress) -> SheetResult<usize> {
        self.merged_regions_mut().add(region)
    }

    pub fn remove_merged_region(&mut self, index: usize) -> SheetResult<CellRangeAddress> {
        self.merged_regions_mut().remove_at(index)
    }

    pub fn merged_region(&self, index: usize) -> Option<CellRangeAddress> {
        self.merged_regions().get(index)
    }

    pub fn num_merged_regions(&self) -> usize {
        self.merged_regions().count()
    }

    // ===== Outline =====

    pub fn group_rows(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.outline_mut().group_rows(first, last)
    }

    pub fn ungroup_rows(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.outline_mut().ungroup_rows(first, last)
    }

    pub fn group_columns(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.outline_mut().group_columns(first, last)
    }

    pub fn ungroup_columns(&mut self, first: u32, last: u32) -> SheetResult<()> {
        self.outline_mut().ungroup_columns(first, last)
    }

    // ===== Rows =====

    /// ROW record for `row`, created (and DIMENSIONS widened) when absent.
    pub fn create_row(&mut self, row: u32) -> SheetResult<&mut RowRecord> {
        let row = rows::check_row(row)?;
        let index = rows::ensure_row(&mut self.records, row)?;
        match self.records.get_mut(index) {
            Some(Record::Row(record)) => Ok(record),
            _ => Err(SheetError::missing(sid::ROW)),
        }
    }

    pub fn row(&self, row: u32) -> Option<&RowRecord> {
        u16::try_from(row)
            .ok()
            .and_then(|row| rows::find_row(&self.records, row))
    }

    pub fn row_mut(&mut self, row: u32) -> Option<&mut RowRecord> {
        let row = u16::try_from(row).ok()?;
        rows::find_row_mut(&mut self.records, row)
    }

    /// Remove the ROW record for `row`; returns whether one existed.
    pub fn remove_row(&mut self, row: u32) -> SheetResult<bool> {
        let row = rows::check_row(row)?;
        Ok(rows::remove_row(&mut self.records, row))
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowRecord> {
        rows::rows(&self.records)
    }

    pub fn row_outline_level(&self, row: u32) -> u8 {
        self.outline().row_level(row)
    }

    /// Move rows `first..=last` by `delta`, replacing rows at the destination
    /// and carrying merged regions anchored in the band along.
    pub fn shift_rows(&mut self, first: u32, last: u32, delta: i32) -> SheetResult<()> {
        if first > last {
            return Err(SheetError::InvalidArgument(format!(
                "first row {} is after last row {}",
                first, last
            )));
        }
        let first = rows::check_row(first)?;
        let last = rows::check_row(last)?;
        for bound in [first as i64 + delta as i64, last as i64 + delta as i64] {
            if bound < 0 || bound > MAX_ROW as i64 {
                return Err(SheetError::out_of_range("row", bound, MAX_ROW));
            }
        }
        if delta == 0 {
            return Ok(());
        }
        self.merged_regions_mut()
            .shift_for_row_move(first as u32, last as u32, delta)?;
        rows::shift_row_records(&mut self.records, first, last, delta);
        Ok(())
    }

    // ===== Columns =====

    /// Width of `col` in 1/256 of a character.
    pub fn column_width(&self, col: u32) -> SheetResult<u16> {
        let col = columns::check_column(col)?;
        columns::column_width(&self.records, col)
    }

    pub fn set_column_width(&mut self, col: u32, width: u16) -> SheetResult<()> {
        let col = columns::check_column(col)?;
        if width > MAX_COLUMN_WIDTH {
            return Err(SheetError::InvalidArgument(format!(
                "column width {} exceeds the maximum of {}",
                width, MAX_COLUMN_WIDTH
            )));
        }
        columns::column_info_mut(&mut self.records, col)?.width = width;
        Ok(())
    }

    /// Default column width in characters.
    pub fn default_column_width(&self) -> SheetResult<u16> {
        columns::default_column_width(&self.records)
    }

    pub fn set_default_column_width(&mut self, width: u16) -> SheetResult<()> {
        let value = find_record_mut!(self.records, DefColWidth)
            .ok_or_else(|| SheetError::missing(sid::DEFCOLWIDTH))?;
        *value = width;
        Ok(())
    }

    pub fn is_column_hidden(&self, col: u32) -> SheetResult<bool> {
        let col = columns::check_column(col)?;
        Ok(columns::column_info(&self.records, col).is_some_and(|c| c.hidden()))
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) -> SheetResult<()> {
        let col = columns::check_column(col)?;
        columns::column_info_mut(&mut self.records, col)?.set_hidden(hidden);
        Ok(())
    }

    /// Cell format index applied to `col`, absent when the column has no COLINFO.
    pub fn column_style(&self, col: u32) -> SheetResult<Option<u16>> {
        let col = columns::check_column(col)?;
        Ok(columns::column_info(&self.records, col).map(|c| c.xf_index))
    }

    pub fn set_default_column_style(&mut self, col: u32, xf_index: u16) -> SheetResult<()> {
        let col = columns::check_column(col)?;
        columns::column_info_mut(&mut self.records, col)?.xf_index = xf_index;
        Ok(())
    }

    pub fn column_outline_level(&self, col: u32) -> u8 {
        self.outline().column_level(col)
    }

    pub fn default_row_height(&self) -> SheetResult<u16> {
        find_record!(self.records, DefaultRowHeight)
            .map(|r| r.height)
            .ok_or_else(|| SheetError::missing(sid::DEFAULTROWHEIGHT))
    }

    pub fn set_default_row_height(&mut self, height: u16) -> SheetResult<()> {
        let record = find_record_mut!(self.records, DefaultRowHeight)
            .ok_or_else(|| SheetError::missing(sid::DEFAULTROWHEIGHT))?;
        record.height = height;
        Ok(())
    }

    // ===== View =====

    fn window2(&self) -> SheetResult<&Window2Record> {
        find_record!(self.records, Window2).ok_or_else(|| SheetError::missing(sid::WINDOW2))
    }

    fn window2_mut(&mut self) -> SheetResult<&mut Window2Record> {
        find_record_mut!(self.records, Window2).ok_or_else(|| SheetError::missing(sid::WINDOW2))
    }

    window_flag!(display_gridlines, set_display_gridlines, DISPLAY_GRIDLINES);
    window_flag!(display_formulas, set_display_formulas, DISPLAY_FORMULAS);
    window_flag!(
        display_row_col_headings,
        set_display_row_col_headings,
        DISPLAY_ROW_COL_HEADINGS
    );
    window_flag!(display_zeros, set_display_zeros, DISPLAY_ZEROS);
    window_flag!(is_selected, set_selected, SELECTED);

    pub fn top_row(&self) -> SheetResult<u16> {
        self.page_settings().top_row()
    }

    pub fn left_col(&self) -> SheetResult<u16> {
        self.page_settings().left_col()
    }

    pub fn show_in_pane(&mut self, top_row: u16, left_col: u16) -> SheetResult<()> {
        self.page_settings_mut().show_in_pane(top_row, left_col)
    }

    pub fn set_zoom(&mut self, numerator: u16, denominator: u16) -> SheetResult<()> {
        self.page_settings_mut().set_zoom(numerator, denominator)
    }

    // ===== Workspace flags =====

    pub fn ws_bool(&self) -> SheetResult<WsBoolFlags> {
        find_record!(self.records, WsBool)
            .copied()
            .ok_or_else(|| SheetError::missing(sid::WSBOOL))
    }

    pub fn set_ws_bool_flag(&mut self, flag: WsBoolFlags, value: bool) -> SheetResult<()> {
        let flags = find_record_mut!(self.records, WsBool)
            .ok_or_else(|| SheetError::missing(sid::WSBOOL))?;
        flags.set(flag, value);
        Ok(())
    }

    wsbool_flag!(
        /// Show automatic page breaks.
        autobreaks, set_autobreaks, SHOW_AUTO_BREAKS
    );
    wsbool_flag!(
        /// Sheet is a dialog sheet.
        dialog, set_dialog, DIALOG
    );
    wsbool_flag!(row_sums_below, set_row_sums_below, ROW_SUMS_BELOW);
    wsbool_flag!(row_sums_right, set_row_sums_right, ROW_SUMS_RIGHT);
    wsbool_flag!(fit_to_page, set_fit_to_page, FIT_TO_PAGE);
    wsbool_flag!(
        /// Show outline symbols.
        display_guts, set_display_guts, DISPLAY_GUTS
    );
    wsbool_flag!(
        alternate_expression,
        set_alternate_expression,
        ALTERNATE_EXPRESSION
    );
    wsbool_flag!(alternate_formula, set_alternate_formula, ALTERNATE_FORMULA);

    // ===== Calculation =====

    /// Whether Excel recalculates every formula when the file is opened.
    pub fn force_formula_recalculation(&self) -> bool {
        self.records.contains(sid::UNCALCED)
    }

    pub fn set_force_formula_recalculation(&mut self, value: bool) {
        if value {
            self.records.get_or_insert_with(sid::UNCALCED, || Record::Uncalced(0));
        } else {
            self.records.remove_all(sid::UNCALCED);
        }
    }

    pub fn gridset(&self) -> bool {
        self.page_settings().gridset()
    }

    pub fn set_print_gridlines(&mut self, value: bool) {
        self.page_settings_mut().set_print_gridlines(value);
    }
}
