//! Workbook-wide defaults applied to newly created sheets.

use serde::{Deserialize, Serialize};

/// Options controlling how a [`Workbook`](crate::workbook::Workbook) creates sheets.
///
/// Deserializing from a partial document fills every missing field with its
/// default, so configuration files only need to name what they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookOptions {
    /// Default column width in characters (DEFCOLWIDTH)
    pub default_column_width: u16,
    /// Default row height in twips (DEFAULTROWHEIGHT)
    pub default_row_height: u16,
    /// Prefix for generated sheet names, followed by a number
    pub sheet_name_prefix: String,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            default_column_width: 8,
            default_row_height: 0x00FF,
            sheet_name_prefix: "Sheet".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let opts: WorkbookOptions = serde_json::from_str(r#"{"default_column_width": 12}"#).unwrap();
        assert_eq!(opts.default_column_width, 12);
        assert_eq!(opts.default_row_height, 0x00FF);
        assert_eq!(opts.sheet_name_prefix, "Sheet");
    }

    #[test]
    fn test_serialize_names_fields() {
        let json = serde_json::to_string(&WorkbookOptions::default()).unwrap();
        assert!(json.contains("\"sheet_name_prefix\":\"Sheet\""));
    }
}
