//! Key/value-list block extractor (PI and Project sections).

use crate::config::{MarkerSet, SectionLayout};
use crate::error::{Result, SheetlintError};
use crate::input::TableWindow;
use crate::model::CollectionType;

use super::strip_trailing_absent;

/// One parsed block row: a field and its ordered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTuple {
    pub collection_type: CollectionType,
    pub field: String,
    /// One value per sub-project; interior gaps are kept as `nan`.
    pub values: Vec<String>,
}

/// Reads a block where column 0 is the field name and the remaining columns
/// hold one or more values.
///
/// Rows with an absent key or an instructional key ("Optional fields ...")
/// are skipped. The collection type of each row comes from the configured
/// [`SectionLayout`].
pub struct BlockExtractor<'a> {
    window: &'a TableWindow,
    layout: &'a SectionLayout,
    markers: &'a MarkerSet,
    next_row: usize,
    current: Option<CollectionType>,
    failed: bool,
}

impl<'a> BlockExtractor<'a> {
    /// Create an extractor over a window.
    pub fn new(window: &'a TableWindow, layout: &'a SectionLayout, markers: &'a MarkerSet) -> Self {
        Self {
            window,
            layout,
            markers,
            next_row: 0,
            current: None,
            failed: false,
        }
    }

    fn read_row(&mut self, row: usize) -> Option<Result<BlockTuple>> {
        let window = self.window;
        let (key, rest) = window.row(row)?.split_first()?;

        if key.is_absent() || self.markers.is_instruction(key.text()) {
            return None;
        }

        let values: Vec<String> = rest.iter().map(|c| c.text().to_string()).collect();

        let collection_type = match self.layout {
            SectionLayout::Markers => {
                if self.markers.is_section(key.text()) {
                    let name = match rest.first() {
                        Some(first) if !first.is_absent() => first.text(),
                        _ => key.text().split_whitespace().next().unwrap_or_default(),
                    };
                    return match CollectionType::parse(name) {
                        Ok(collection) => {
                            self.current = Some(collection);
                            None
                        }
                        Err(e) => Some(Err(e)),
                    };
                }
                match self.current {
                    Some(collection) => collection,
                    None => {
                        return Some(Err(SheetlintError::DictionarySchema {
                            row: self.window.sheet_row(row).unwrap_or(row) + 1,
                            message: format!(
                                "field '{}' in sheet '{}' appears before any collection marker row",
                                key.text(),
                                self.window.sheet
                            ),
                        }));
                    }
                }
            }
            SectionLayout::Boundary { row: boundary, before, after } => {
                if row < *boundary {
                    *before
                } else {
                    *after
                }
            }
            SectionLayout::Fixed { collection } => *collection,
        };

        Some(Ok(BlockTuple {
            collection_type,
            field: key.text().to_string(),
            values: strip_trailing_absent(values),
        }))
    }
}

impl Iterator for BlockExtractor<'_> {
    type Item = Result<BlockTuple>;

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
