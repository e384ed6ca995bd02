//! Keyed multi-record extractor (Sample section).

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::config::MarkerSet;
use crate::error::{Result, SheetlintError};
use crate::input::{Cell, TableWindow, ABSENT};

/// One sample attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTuple {
    pub sample_id: String,
    pub field: String,
    pub value: String,
}

/// Reads a table with one header row and one entity per following row.
///
/// The header row is the first row with a cell equal to the key label
/// (case-insensitive). That cell's column holds each row's identifier. For
/// every data row the extractor yields one tuple per header attribute, then a
/// final tuple binding the key field to the identifier itself.
pub struct RecordExtractor<'a> {
    window: &'a TableWindow,
    markers: &'a MarkerSet,
    key_column: usize,
    key_field: String,
    attributes: Vec<(usize, String)>,
    next_row: usize,
    pending: VecDeque<RecordTuple>,
    seen: HashSet<String>,
}

impl<'a> RecordExtractor<'a> {
    /// Locate the header row. Fails with `RequiredHeaderMissing` when no cell
    /// matches `key_label`.
    pub fn new(window: &'a TableWindow, key_label: &str, markers: &'a MarkerSet) -> Result<Self> {
        let label = key_label.trim();
        let (header_row, key_column) = window
            .rows()
            .find_map(|(row, cells)| {
                cells
                    .iter()
                    .position(|c| !c.is_absent() && c.text().trim().eq_ignore_ascii_case(label))
                    .map(|col| (row, col))
            })
            .ok_or_else(|| SheetlintError::RequiredHeaderMissing {
                sheet: window.sheet.clone(),
                label: key_label.to_string(),
            })?;

        let header = window.row(header_row).unwrap_or_default();
        let width = header
            .iter()
            .rposition(|c| !c.is_absent())
            .map_or(0, |last| last + 1);

        let key_field = header[key_column].text().to_string();
        let attributes: Vec<(usize, String)> = header[..width]
            .iter()
            .enumerate()
            .filter(|(col, cell)| *col != key_column && !cell.is_absent())
            .map(|(col, cell)| (col, cell.text().to_string()))
            .collect();

        debug!(
            sheet = %window.sheet,
            header_row,
            key_column,
            attributes = attributes.len(),
            "located record header"
        );

        Ok(Self {
            window,
            markers,
            key_column,
            key_field,
            attributes,
            next_row: header_row + 1,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        })
    }

    /// Header text of the identifier column.
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Attribute names in header order (the key field excluded).
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(_, name)| name.as_str())
    }

    fn queue_row(&mut self, cells: &[Cell]) {
        let Some(id_cell) = cells.get(self.key_column) else {
            return;
        };
        if id_cell.is_absent() || self.markers.is_instruction(id_cell.text()) {
            return;
        }

        let sample_id = id_cell.text().to_string();
        if !self.seen.insert(sample_id.clone()) {
            warn!(
                sheet = %self.window.sheet,
                sample_id = %sample_id,
                "duplicate sample identifier; later values overwrite earlier ones"
            );
        }

        for (col, name) in &self.attributes {
            let value = cells.get(*col).map_or(ABSENT, Cell::text);
            self.pending.push_back(RecordTuple {
                sample_id: sample_id.clone(),
                field: name.clone(),
                value: value.to_string(),
            });
        }
        self.pending.push_back(RecordTuple {
            field: self.key_field.clone(),
            value: sample_id.clone(),
            sample_id,
        });
    }
}

impl Iterator for RecordExtractor<'_> {
    type Item = RecordTuple;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.pending.pop_front() {
                return Some(tuple);
            }
            let window = self.window;
            let cells = window.row(self.next_row)?;
            self.next_row += 1;
            self.queue_row(cells);
        }
    }
}
