//! Print and view settings of a worksheet.
//!
//! Optional records (centering, margins, page breaks, SCL...) are created the
//! first time they are written and reported as absent until then. Required
//! records such as WINDOW2 must already exist.

use std::ops::{Deref, DerefMut};

use crate::error::{SheetError, SheetResult};
use crate::records::{
    Flag, MAX_COLUMN, MAX_ROW, MarginKind, PageBreak, PageBreakRecord, PrintSetupRecord, Record,
    SclRecord, Window2Record, sid,
};
use crate::stream::{RecordStream, find_record, find_record_mut};

/// View over the page and print settings records of one sheet.
pub struct PageSettings<S> {
    stream: S,
}

impl<S> PageSettings<S> {
    pub(crate) fn new(stream: S) -> Self {
        Self { stream }
    }
}

fn bool_record(stream: &RecordStream, record_sid: u16) -> Option<bool> {
    match stream.find_first(record_sid)? {
        Record::HCenter(v)
        | Record::VCenter(v)
        | Record::PrintGridlines(v)
        | Record::PrintHeaders(v)
        | Record::Gridset(v) => Some(v.get()),
        _ => None,
    }
}

fn set_bool_record(
    stream: &mut RecordStream,
    record_sid: u16,
    value: bool,
    make: fn(Flag) -> Record,
) {
    match stream.get_or_insert_with(record_sid, || make(value.into())) {
        Record::HCenter(v)
        | Record::VCenter(v)
        | Record::PrintGridlines(v)
        | Record::PrintHeaders(v)
        | Record::Gridset(v) => v.set(value),
        _ => {},
    }
}

impl<S: Deref<Target = RecordStream>> PageSettings<S> {
    pub fn horizontally_center(&self) -> bool {
        bool_record(&self.stream, sid::HCENTER).unwrap_or(false)
    }

    pub fn vertically_center(&self) -> bool {
        bool_record(&self.stream, sid::VCENTER).unwrap_or(false)
    }

    pub fn print_setup(&self) -> Option<&PrintSetupRecord> {
        find_record!(self.stream, Setup)
    }

    /// Zoom as `(numerator, denominator)`, absent when the sheet has no SCL.
    pub fn zoom(&self) -> Option<(u16, u16)> {
        find_record!(self.stream, Scl).map(|scl| (scl.numerator, scl.denominator))
    }

    pub fn print_gridlines(&self) -> bool {
        bool_record(&self.stream, sid::PRINTGRIDLINES).unwrap_or(false)
    }

    /// GRIDSET flag; sheets without the record behave as if it were set.
    pub fn gridset(&self) -> bool {
        bool_record(&self.stream, sid::GRIDSET).unwrap_or(true)
    }

    pub fn print_headings(&self) -> bool {
        bool_record(&self.stream, sid::PRINTHEADERS).unwrap_or(false)
    }

    pub fn header(&self) -> Option<&str> {
        find_record!(self.stream, Header).and_then(|h| h.as_deref())
    }

    pub fn footer(&self) -> Option<&str> {
        find_record!(self.stream, Footer).and_then(|f| f.as_deref())
    }

    /// Margin in inches; absent margins read as Excel's defaults.
    pub fn margin(&self, kind: MarginKind) -> f64 {
        self.stream
            .iter()
            .find_map(|r| match r {
                Record::Margin { kind: k, inches } if *k == kind => Some(*inches),
                _ => None,
            })
            .unwrap_or_else(|| kind.default_inches())
    }

    fn breaks(&self, record_sid: u16) -> Option<&PageBreakRecord> {
        match self.stream.find_first(record_sid)? {
            Record::HorizontalPageBreaks(r) | Record::VerticalPageBreaks(r) => Some(r),
            _ => None,
        }
    }

    /// Rows with a manual page break, ascending.
    pub fn row_breaks(&self) -> Vec<u16> {
        self.breaks(sid::HORIZONTALPAGEBREAKS)
            .map(|r| r.sorted().iter().map(|b| b.position).collect())
            .unwrap_or_default()
    }

    /// Columns with a manual page break, ascending.
    pub fn column_breaks(&self) -> Vec<u16> {
        self.breaks(sid::VERTICALPAGEBREAKS)
            .map(|r| r.sorted().iter().map(|b| b.position).collect())
            .unwrap_or_default()
    }

    pub fn is_row_broken(&self, row: u32) -> bool {
        u16::try_from(row).is_ok_and(|row| {
            self.breaks(sid::HORIZONTALPAGEBREAKS)
                .is_some_and(|r| r.contains(row))
        })
    }

    pub fn is_column_broken(&self, col: u32) -> bool {
        u16::try_from(col).is_ok_and(|col| {
            self.breaks(sid::VERTICALPAGEBREAKS)
                .is_some_and(|r| r.contains(col))
        })
    }

    fn window2(&self) -> SheetResult<&Window2Record> {
        find_record!(self.stream, Window2).ok_or_else(|| SheetError::missing(sid::WINDOW2))
    }

    /// First visible row of the view.
    pub fn top_row(&self) -> SheetResult<u16> {
        Ok(self.window2()?.top_row)
    }

    /// First visible column of the view.
    pub fn left_col(&self) -> SheetResult<u16> {
        Ok(self.window2()?.left_col)
    }
}

impl<S: DerefMut<Target = RecordStream>> PageSettings<S> {
    pub fn set_horizontally_center(&mut self, value: bool) {
        set_bool_record(&mut self.stream, sid::HCENTER, value, Record::HCenter);
    }

    pub fn set_vertically_center(&mut self, value: bool) {
        set_bool_record(&mut self.stream, sid::VCENTER, value, Record::VCenter);
    }

    pub fn set_print_headings(&mut self, value: bool) {
        set_bool_record(&mut self.stream, sid::PRINTHEADERS, value, Record::PrintHeaders);
    }

    /// Print gridlines; GRIDSET always holds the opposite value.
    pub fn set_print_gridlines(&mut self, value: bool) {
        set_bool_record(&mut self.stream, sid::PRINTGRIDLINES, value, Record::PrintGridlines);
        set_bool_record(&mut self.stream, sid::GRIDSET, !value, Record::Gridset);
    }

    /// Print setup, created with Excel's defaults when absent.
    pub fn print_setup_mut(&mut self) -> SheetResult<&mut PrintSetupRecord> {
        match self
            .stream
            .get_or_insert_with(sid::SETUP, || Record::Setup(PrintSetupRecord::default()))
        {
            Record::Setup(setup) => Ok(setup),
            _ => Err(SheetError::missing(sid::SETUP)),
        }
    }

    /// Set the zoom to `numerator / denominator`.
    ///
    /// The SCL record must directly follow WINDOW2; it is moved there if
    /// anything was inserted in between since it was last written.
    pub fn set_zoom(&mut self, numerator: u16, denominator: u16) -> SheetResult<()> {
        let scl = SclRecord::new(numerator, denominator)?;
        let window = self.stream.require(sid::WINDOW2)?;
        if let Some(Record::Scl(existing)) = self.stream.get_mut(window + 1) {
            *existing = scl;
            return Ok(());
        }
        if self.stream.remove_all(sid::SCL) > 0 {
            log::debug!("moving SCL next to WINDOW2");
        }
        let window = self.stream.require(sid::WINDOW2)?;
        self.stream.insert_at(window + 1, Record::Scl(scl))
    }

    pub fn set_header(&mut self, text: Option<&str>) {
        let value = text.map(str::to_string);
        if let Record::Header(h) = self.stream.get_or_insert_with(sid::HEADER, || Record::Header(None)) {
            *h = value;
        }
    }

    pub fn set_footer(&mut self, text: Option<&str>) {
        let value = text.map(str::to_string);
        if let Record::Footer(f) = self.stream.get_or_insert_with(sid::FOOTER, || Record::Footer(None)) {
            *f = value;
        }
    }

    pub fn set_margin(&mut self, kind: MarginKind, inches: f64) {
        let record = self.stream.get_or_insert_with(kind.sid(), || Record::Margin {
            kind,
            inches,
        });
        if let Record::Margin { inches: value, .. } = record {
            *value = inches;
        }
    }

    fn breaks_mut(&mut self, record_sid: u16) -> SheetResult<&mut PageBreakRecord> {
        let make = if record_sid == sid::HORIZONTALPAGEBREAKS {
            Record::HorizontalPageBreaks
        } else {
            Record::VerticalPageBreaks
        };
        match self
            .stream
            .get_or_insert_with(record_sid, || make(PageBreakRecord::default()))
        {
            Record::HorizontalPageBreaks(r) | Record::VerticalPageBreaks(r) => Ok(r),
            _ => Err(SheetError::missing(record_sid)),
        }
    }

    /// Add a manual page break above `row`. Adding an existing break does nothing.
    pub fn set_row_break(&mut self, row: u32) -> SheetResult<()> {
        if row > MAX_ROW {
            return Err(SheetError::out_of_range("row", row, MAX_ROW));
        }
        self.breaks_mut(sid::HORIZONTALPAGEBREAKS)?.add(PageBreak {
            position: row as u16,
            sub_from: 0,
            sub_to: MAX_COLUMN,
        })?;
        Ok(())
    }

    /// Add a manual page break left of `col`. Adding an existing break does nothing.
    pub fn set_column_break(&mut self, col: u32) -> SheetResult<()> {
        if col > MAX_COLUMN as u32 {
            return Err(SheetError::out_of_range("column", col, MAX_COLUMN));
        }
        self.breaks_mut(sid::VERTICALPAGEBREAKS)?.add(PageBreak {
            position: col as u16,
            sub_from: 0,
            sub_to: MAX_ROW as u16,
        })?;
        Ok(())
    }

    /// Remove the break at `row`; the (possibly empty) record stays.
    pub fn remove_row_break(&mut self, row: u32) -> bool {
        let Ok(row) = u16::try_from(row) else {
            return false;
        };
        match find_record_mut!(self.stream, HorizontalPageBreaks) {
            Some(breaks) => breaks.remove(row),
            None => false,
        }
    }

    pub fn remove_column_break(&mut self, col: u32) -> bool {
        let Ok(col) = u16::try_from(col) else {
            return false;
        };
        match find_record_mut!(self.stream, VerticalPageBreaks) {
            Some(breaks) => breaks.remove(col),
            None => false,
        }
    }

    /// Scroll the view so that `top_row` and `left_col` are the first visible cells.
    pub fn show_in_pane(&mut self, top_row: u16, left_col: u16) -> SheetResult<()> {
        let window = find_record_mut!(self.stream, Window2)
            .ok_or_else(|| SheetError::missing(sid::WINDOW2))?;
        window.top_row = top_row;
        window.left_col = left_col;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BofRecord, Window2Record};

    fn stream() -> RecordStream {
        RecordStream::from_records(vec![
            Record::Bof(BofRecord::worksheet()),
            Record::Gridset(Flag::ON),
            Record::DefColWidth(8),
            Record::Window2(Window2Record::default()),
            Record::Selection(Default::default()),
            Record::Eof,
        ])
    }

    #[test]
    fn test_center_flags_created_lazily() {
        let mut records = stream();
        let mut settings = PageSettings::new(&mut records);
        assert!(!settings.vertically_center());
        settings.set_vertically_center(true);
        settings.set_vertically_center(true);
        assert!(settings.vertically_center());
        assert_eq!(records.iter().filter(|r| r.sid() == sid::VCENTER).count(), 1);
        assert_eq!(records.locate_first(sid::VCENTER), Some(2));
    }

    #[test]
    fn test_zoom_follows_window2() {
        let mut records = stream();
        let mut settings = PageSettings::new(&mut records);
        assert_eq!(settings.zoom(), None);
        settings.set_zoom(3, 4).unwrap();
        assert_eq!(settings.zoom(), Some((3, 4)));
        assert!(settings.set_zoom(0, 4).is_err());

        // Something lands between WINDOW2 and SCL; the next write repairs it.
        let window = records.locate_first(sid::WINDOW2).unwrap();
        records
            .insert_at(
                window + 1,
                Record::Unknown {
                    sid: sid::PANE,
                    data: vec![0; 10],
                },
            )
            .unwrap();
        let mut settings = PageSettings::new(&mut records);
        settings.set_zoom(2, 1).unwrap();
        let window = records.locate_first(sid::WINDOW2).unwrap();
        assert!(matches!(
            records.get(window + 1),
            Some(Record::Scl(SclRecord {
                numerator: 2,
                denominator: 1
            }))
        ));
        assert_eq!(records.iter().filter(|r| r.sid() == sid::SCL).count(), 1);
    }

    #[test]
    fn test_zoom_without_window2_is_logic_error() {
        let mut records = RecordStream::from_records(vec![Record::Eof]);
        let err = PageSettings::new(&mut records).set_zoom(1, 1).unwrap_err();
        assert!(err.is_logic_error());
    }

    #[test]
    fn test_margins_default_and_override() {
        let mut records = stream();
        let mut settings = PageSettings::new(&mut records);
        assert_eq!(settings.margin(MarginKind::Left), 0.75);
        assert_eq!(settings.margin(MarginKind::Bottom), 1.0);
        settings.set_margin(MarginKind::Bottom, 0.4);
        settings.set_margin(MarginKind::Bottom, 0.5);
        assert_eq!(settings.margin(MarginKind::Bottom), 0.5);
        assert_eq!(settings.margin(MarginKind::Top), 1.0);
    }

    #[test]
    fn test_break_bounds() {
        let mut records = stream();
        let mut settings = PageSettings::new(&mut records);
        assert!(settings.set_row_break(70000).is_err());
        assert!(settings.set_column_break(256).is_err());
        settings.set_column_break(255).unwrap();
        assert_eq!(settings.column_breaks(), vec![255]);
        assert!(!settings.remove_row_break(3));
    }

    #[test]
    fn test_header_footer() {
        let mut records = stream();
        let mut settings = PageSettings::new(&mut records);
        assert_eq!(settings.header(), None);
        settings.set_header(Some("&LLeft"));
        settings.set_footer(Some("&P"));
        assert_eq!(settings.header(), Some("&LLeft"));
        assert_eq!(settings.footer(), Some("&P"));
        settings.set_header(None);
        assert_eq!(settings.header(), None);
    }
}
