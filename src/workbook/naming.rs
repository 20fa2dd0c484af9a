//! Sheet name rules and unique name generation.

use crate::error::{SheetError, SheetResult};

/// Longest sheet name Excel accepts, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name against Excel's rules.
pub fn validate_sheet_name(name: &str) -> SheetResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_LEN {
        return Err(SheetError::InvalidArgument(format!(
            "sheet name '{}' must be 1 to {} characters long",
            name, MAX_SHEET_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(SheetError::InvalidArgument(format!(
            "sheet name '{}' contains the forbidden character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Split `"<prefix> (<n>)"` into prefix and number.
///
/// Whitespace around the number and before the parenthesis is ignored.
fn split_counter(name: &str) -> Option<(&str, u32)> {
    let inner = name.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let number = inner[open + 1..].trim().parse().ok()?;
    let prefix = inner[..open].trim_end();
    if prefix.is_empty() {
        return None;
    }
    Some((prefix, number))
}

/// `"<prefix> (<n>)"`, with the prefix shortened so the result fits in a sheet name.
fn with_counter(prefix: &str, n: u32) -> String {
    let suffix = format!(" ({})", n);
    let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
    let prefix: String = prefix.chars().take(room).collect();
    format!("{}{}", prefix.trim_end(), suffix)
}

/// Generates sheet names that do not collide with existing ones.
///
/// Names compare ignoring ASCII case, as Excel does.
#[derive(Debug, Clone)]
pub struct SheetNameAllocator<'a> {
    existing: Vec<&'a str>,
}

impl<'a> SheetNameAllocator<'a> {
    pub fn new(existing: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            existing: existing.into_iter().collect(),
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.existing.iter().any(|e| e.eq_ignore_ascii_case(name))
    }

    /// `base` when free; otherwise the next free `"<prefix> (<n>)"`.
    ///
    /// A base that already ends in a counter continues from it, so
    /// `"abc ( 123)"` becomes `"abc (124)"`. Any other base starts at 2.
    ///
    /// # Examples
    ///
    /// ```
    /// use biffsheet::workbook::SheetNameAllocator;
    ///
    /// let names = SheetNameAllocator::new(["Test Clone", "Test Clone (2)"]);
    /// assert_eq!(names.allocate("Test Clone"), "Test Clone (3)");
    /// ```
    pub fn allocate(&self, base: &str) -> String {
        if !self.is_taken(base) {
            return base.to_string();
        }
        let (prefix, mut n) = match split_counter(base) {
            Some((prefix, n)) => (prefix, n.saturating_add(1)),
            None => (base, 2),
        };
        loop {
            let candidate = with_counter(prefix, n);
            if !self.is_taken(&candidate) {
                return candidate;
            }
            n = n.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_base_is_kept() {
        let names = SheetNameAllocator::new(["Sheet1"]);
        assert_eq!(names.allocate("abc ( 123)"), "abc ( 123)");
    }

    #[test]
    fn test_counter_continues() {
        let names = SheetNameAllocator::new(["Test Clone", "Test Clone (2)"]);
        assert_eq!(names.allocate("Test Clone"), "Test Clone (3)");
        assert_eq!(names.allocate("test clone (2)"), "test clone (3)");

        let names = SheetNameAllocator::new(["abc ( 123)"]);
        assert_eq!(names.allocate("abc ( 123)"), "abc (124)");
    }

    #[test]
    fn test_case_insensitive_collision() {
        let names = SheetNameAllocator::new(["DATA"]);
        assert!(names.is_taken("data"));
        assert_eq!(names.allocate("Data"), "Data (2)");
    }

    #[test]
    fn test_long_names_are_trimmed() {
        let base = "A".repeat(31);
        let names = SheetNameAllocator::new([base.as_str()]);
        let name = names.allocate(&base);
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(name.ends_with(" (2)"));
    }

    #[test]
    fn test_split_counter() {
        assert_eq!(split_counter("abc ( 123)"), Some(("abc", 123)));
        assert_eq!(split_counter("abc(7 )"), Some(("abc", 7)));
        assert_eq!(split_counter("(7)"), None);
        assert_eq!(split_counter("abc (x)"), None);
    }

    #[test]
    fn test_validate() {
        assert!(validate_sheet_name("Budget 2024").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }
}
