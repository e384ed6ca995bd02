//! Data Dictionary extractor.

use tracing::warn;

use crate::config::{DictionaryLayout, MarkerSet};
use crate::error::{Result, SheetlintError};
use crate::input::{Cell, TableWindow, ABSENT_CELL};
use crate::model::{CollectionType, DictionaryEntry};

/// Reads dictionary rows, carrying the current collection type across rows.
///
/// A row whose collection cell contains the section marker ("PI_Lab
/// Collection") switches the collection type to the first word of that cell.
/// Rows with an absent requirement cell are separators. Every other row is one
/// [`DictionaryEntry`]. A data row before any section header is an error.
pub struct DictionaryExtractor<'a> {
    window: &'a TableWindow,
    layout: &'a DictionaryLayout,
    markers: &'a MarkerSet,
    next_row: usize,
    current: Option<CollectionType>,
    failed: bool,
}

impl<'a> DictionaryExtractor<'a> {
    /// Create an extractor, checking the mandatory columns exist.
    pub fn new(
        window: &'a TableWindow,
        layout: &'a DictionaryLayout,
        markers: &'a MarkerSet,
    ) -> Result<Self> {
        let width = window.column_count();
        let mandatory = [
            layout.collection_column,
            layout.required_column,
            layout.field_column,
            layout.external_column,
        ];
        if window.row_count() > 0 {
            if let Some(bad) = mandatory.iter().find(|&&c| c >= width) {
                return Err(SheetlintError::Layout {
                    sheet: window.sheet.clone(),
                    message: format!(
                        "dictionary column {} is out of range (window has {} columns)",
                        bad, width
                    ),
                });
            }
        }

        Ok(Self {
            window,
            layout,
            markers,
            next_row: 0,
            current: None,
            failed: false,
        })
    }

    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.window.get(row, col).unwrap_or(&ABSENT_CELL)
    }

    fn optional_text(&self, row: usize, col: Option<usize>) -> Option<String> {
        let cell = self.cell(row, col?);
        if cell.is_absent() {
            None
        } else {
            Some(cell.text().to_string())
        }
    }

    fn sheet_row(&self, row: usize) -> usize {
        self.window.sheet_row(row).unwrap_or(row) + 1
    }

    fn read_row(&mut self, row: usize) -> Option<Result<DictionaryEntry>> {
        let collection_cell = self.cell(row, self.layout.collection_column);
        if !collection_cell.is_absent() && self.markers.is_section(collection_cell.text()) {
            let first_word = collection_cell.text().split_whitespace().next().unwrap_or_default();
            return match CollectionType::parse(first_word) {
                Ok(collection) => {
                    self.current = Some(collection);
                    None
                }
                Err(e) => Some(Err(e)),
            };
        }

        let required = self.cell(row, self.layout.required_column);
        if required.is_absent() {
            return None;
        }

        let field = self.cell(row, self.layout.field_column);
        if field.is_absent() {
            warn!(
                sheet = %self.window.sheet,
                row = self.sheet_row(row),
                "dictionary row has a requirement flag but no field name; skipping"
            );
            return None;
        }

        let Some(collection_type) = self.current else {
            return Some(Err(SheetlintError::DictionarySchema {
                row: self.sheet_row(row),
                message: format!(
                    "field '{}' appears before any collection header",
                    field.text()
                ),
            }));
        };

        Some(Ok(DictionaryEntry {
            collection_type,
            field_name: field.text().to_string(),
            external_name: self.cell(row, self.layout.external_column).text().to_string(),
            is_required: required.text().to_string(),
            description: self.optional_text(row, self.layout.description_column),
            example: self.optional_text(row, self.layout.example_column),
        }))
    }
}

impl Iterator for DictionaryExtractor<'_> {
    type Item = Result<DictionaryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        while self.next_row < self.window.row_count() {
            let row = self.next_row;
            self.next_row += 1;
            if let Some(item) = self.read_row(row) {
                self.failed = item.is_err();
                return Some(item);
            }
        }
        None
    }
}
