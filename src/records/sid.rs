//! BIFF8 record type identifiers used inside a worksheet substream.
//!
//! Reference: [MS-XLS] 2.3 Record Enumeration

use phf::phf_map;

// Substream framing
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;

// Calculation settings
pub const UNCALCED: u16 = 0x005E;
pub const CALCMODE: u16 = 0x000D;
pub const CALCCOUNT: u16 = 0x000C;
pub const REFMODE: u16 = 0x000F;
pub const ITERATION: u16 = 0x0011;
pub const DELTA: u16 = 0x0010;
pub const SAVERECALC: u16 = 0x005F;

// Print and workspace settings
pub const PRINTHEADERS: u16 = 0x002A;
pub const PRINTGRIDLINES: u16 = 0x002B;
pub const GRIDSET: u16 = 0x0082;
pub const GUTS: u16 = 0x0080;
pub const DEFAULTROWHEIGHT: u16 = 0x0225;
pub const WSBOOL: u16 = 0x0081;

// Page settings block
pub const HORIZONTALPAGEBREAKS: u16 = 0x001B;
pub const VERTICALPAGEBREAKS: u16 = 0x001A;
pub const HEADER: u16 = 0x0014;
pub const FOOTER: u16 = 0x0015;
pub const HCENTER: u16 = 0x0083;
pub const VCENTER: u16 = 0x0084;
pub const LEFTMARGIN: u16 = 0x0026;
pub const RIGHTMARGIN: u16 = 0x0027;
pub const TOPMARGIN: u16 = 0x0028;
pub const BOTTOMMARGIN: u16 = 0x0029;
pub const SETUP: u16 = 0x00A1;

// Protection block
pub const PROTECT: u16 = 0x0012;
pub const SCENPROTECT: u16 = 0x00DD;
pub const OBJPROTECT: u16 = 0x0063;
pub const PASSWORD: u16 = 0x0013;

// Columns, dimensions and rows
pub const DEFCOLWIDTH: u16 = 0x0055;
pub const COLINFO: u16 = 0x007D;
pub const DIMENSIONS: u16 = 0x0200;
pub const ROW: u16 = 0x0208;

// Drawing layer
pub const MSODRAWING: u16 = 0x00EC;
pub const OBJ: u16 = 0x005D;
pub const TXO: u16 = 0x01B6;

// View block
pub const WINDOW2: u16 = 0x023E;
pub const SCL: u16 = 0x00A0;
pub const PANE: u16 = 0x0041;
pub const SELECTION: u16 = 0x001D;
pub const MERGEDCELLS: u16 = 0x00E5;

static NAMES: phf::Map<u16, &'static str> = phf_map! {
    0x0809u16 => "BOF",
    0x000Au16 => "EOF",
    0x005Eu16 => "UNCALCED",
    0x000Du16 => "CALCMODE",
    0x000Cu16 => "CALCCOUNT",
    0x000Fu16 => "REFMODE",
    0x0011u16 => "ITERATION",
    0x0010u16 => "DELTA",
    0x005Fu16 => "SAVERECALC",
    0x002Au16 => "PRINTHEADERS",
    0x002Bu16 => "PRINTGRIDLINES",
    0x0082u16 => "GRIDSET",
    0x0080u16 => "GUTS",
    0x0225u16 => "DEFAULTROWHEIGHT",
    0x0081u16 => "WSBOOL",
    0x001Bu16 => "HORIZONTALPAGEBREAKS",
    0x001Au16 => "VERTICALPAGEBREAKS",
    0x0014u16 => "HEADER",
    0x0015u16 => "FOOTER",
    0x0083u16 => "HCENTER",
    0x0084u16 => "VCENTER",
    0x0026u16 => "LEFTMARGIN",
    0x0027u16 => "RIGHTMARGIN",
    0x0028u16 => "TOPMARGIN",
    0x0029u16 => "BOTTOMMARGIN",
    0x00A1u16 => "SETUP",
    0x0012u16 => "PROTECT",
    0x00DDu16 => "SCENPROTECT",
    0x0063u16 => "OBJPROTECT",
    0x0013u16 => "PASSWORD",
    0x0055u16 => "DEFCOLWIDTH",
    0x007Du16 => "COLINFO",
    0x0200u16 => "DIMENSIONS",
    0x0208u16 => "ROW",
    0x00ECu16 => "MSODRAWING",
    0x005Du16 => "OBJ",
    0x01B6u16 => "TXO",
    0x023Eu16 => "WINDOW2",
    0x00A0u16 => "SCL",
    0x0041u16 => "PANE",
    0x001Du16 => "SELECTION",
    0x00E5u16 => "MERGEDCELLS",
};

/// Human readable name of a record type, `"UNKNOWN"` for anything not listed.
pub fn name(sid: u16) -> &'static str {
    NAMES.get(&sid).copied().unwrap_or("UNKNOWN")
}

/// Canonical order of the worksheet substream.
///
/// Used to place records that are created after the sheet exists: a new
/// record goes after the last present record that precedes it here, or
/// before the first present record that follows it.
pub const SHEET_ORDER: &[u16] = &[
    BOF,
    UNCALCED,
    CALCMODE,
    CALCCOUNT,
    REFMODE,
    ITERATION,
    DELTA,
    SAVERECALC,
    PRINTHEADERS,
    PRINTGRIDLINES,
    GRIDSET,
    GUTS,
    DEFAULTROWHEIGHT,
    WSBOOL,
    HORIZONTALPAGEBREAKS,
    VERTICALPAGEBREAKS,
    HEADER,
    FOOTER,
    HCENTER,
    VCENTER,
    LEFTMARGIN,
    RIGHTMARGIN,
    TOPMARGIN,
    BOTTOMMARGIN,
    SETUP,
    PROTECT,
    SCENPROTECT,
    OBJPROTECT,
    PASSWORD,
    DEFCOLWIDTH,
    COLINFO,
    DIMENSIONS,
    ROW,
    MSODRAWING,
    WINDOW2,
    SCL,
    PANE,
    SELECTION,
    MERGEDCELLS,
    EOF,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(name(WINDOW2), "WINDOW2");
        assert_eq!(name(0x1234), "UNKNOWN");
    }

    #[test]
    fn test_order_has_no_duplicates() {
        for (i, a) in SHEET_ORDER.iter().enumerate() {
            assert!(!SHEET_ORDER[i + 1..].contains(a), "duplicate {}", name(*a));
        }
    }
}
