//! Workbook abstraction, cells and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// String form of an absent cell.
pub const ABSENT: &str = "nan";

/// Check if a value represents an absent cell.
///
/// Blank text and the `nan` marker (which also appears from numeric-to-string
/// coercion upstream) are both absent.
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ABSENT)
}

/// Shared absent cell for lookups that fall outside a row.
pub(crate) static ABSENT_CELL: Cell = Cell::Absent;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    /// Empty or undefined cell.
    #[default]
    Absent,
    /// Cell text, already trimmed once it has gone through a window.
    Value(String),
}

impl Cell {
    /// Build a cell from raw text. Empty text is absent.
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Cell::Absent
        } else {
            Cell::Value(text.to_string())
        }
    }

    /// Text of the cell, with [`ABSENT`] for absent cells.
    pub fn text(&self) -> &str {
        match self {
            Cell::Absent => ABSENT,
            Cell::Value(v) => v,
        }
    }

    /// True for absent cells and cells whose text reads as absent.
    pub fn is_absent(&self) -> bool {
        match self {
            Cell::Absent => true,
            Cell::Value(v) => is_absent(v),
        }
    }

    /// Copy with surrounding whitespace removed.
    pub fn trimmed(&self) -> Cell {
        match self {
            Cell::Absent => Cell::Absent,
            Cell::Value(v) => Cell::Value(v.trim().to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::from_text(text)
    }
}

/// A tabular workbook made of named sheets.
pub trait Workbook {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Raw rows of a sheet, or `None` if the sheet does not exist.
    fn sheet_rows(&self, name: &str) -> Option<&[Vec<Cell>]>;

    /// True if the workbook contains the sheet.
    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_rows(name).is_some()
    }
}

/// Workbook held entirely in memory. All loaders produce one.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: IndexMap<String, Vec<Vec<Cell>>>,
}

impl MemoryWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sheet.
    pub fn add_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) {
        self.sheets.insert(name.into(), rows);
    }

    /// Builder form of [`add_sheet`](Self::add_sheet) taking string rows.
    /// Empty strings become absent cells.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|s| Cell::from_text(s)).collect())
            .collect();
        self.add_sheet(name, rows);
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn sheet_rows(&self, name: &str) -> Option<&[Vec<Cell>]> {
        self.sheets.get(name).map(|rows| rows.as_slice())
    }
}

/// Metadata about the source workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the workbook file or sheet directory.
    pub path: PathBuf,
    /// SHA-256 hash of the input contents.
    pub hash: String,
    /// Input size in bytes.
    pub size_bytes: u64,
    /// Detected format (xlsx, ods, tsv, ...).
    pub format: String,
    /// Number of sheets.
    pub sheet_count: usize,
    /// When the input was read.
    pub analyzed_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for an input that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        sheet_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            sheet_count,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_absent() {
        assert!(is_absent(""));
        assert!(is_absent("   "));
        assert!(is_absent("nan"));
        assert!(is_absent("NaN"));
        assert!(!is_absent("none"));
        assert!(!is_absent("0"));
        assert!(!is_absent("Homo sapiens"));
    }

    #[test]
    fn test_absent_cell_is_distinct_from_nan_text() {
        let absent = Cell::Absent;
        let nan = Cell::Value("nan".to_string());
        assert_ne!(absent, nan);
        assert!(absent.is_absent());
        assert!(nan.is_absent());
        assert_eq!(absent.text(), nan.text());
    }

    #[test]
    fn test_memory_workbook() {
        let wb = MemoryWorkbook::new()
            .with_sheet("Sheet A", &[&["a", ""], &["b", "c"]])
            .with_sheet("Sheet B", &[]);

        assert_eq!(wb.sheet_names(), vec!["Sheet A", "Sheet B"]);
        let rows = wb.sheet_rows("Sheet A").unwrap();
        assert_eq!(rows[0][1], Cell::Absent);
        assert!(wb.has_sheet("Sheet B"));
        assert!(!wb.has_sheet("Sheet C"));
    }
}
