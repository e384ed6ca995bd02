//! Table Window Reader: rectangular, trimmed views into one sheet.

use tracing::debug;

use crate::config::SheetWindow;
use crate::error::{Result, SheetlintError};

use super::source::{Cell, Workbook};

/// A rectangular grid of trimmed cells cut out of one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWindow {
    /// Sheet the window was read from.
    pub sheet: String,
    rows: Vec<Vec<Cell>>,
    /// 0-based sheet row index of each window row.
    row_numbers: Vec<usize>,
}

impl TableWindow {
    /// Build a window directly from rows (sheet row numbers start at 0).
    pub fn from_rows(sheet: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let row_numbers = (0..rows.len()).collect();
        Self {
            sheet: sheet.into(),
            rows,
            row_numbers,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Get a specific cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cells of one row.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        self.rows.get(row).map(|r| r.as_slice())
    }

    /// Sheet row index of a window row.
    pub fn sheet_row(&self, row: usize) -> Option<usize> {
        self.row_numbers.get(row).copied()
    }

    /// Iterate rows with their window index.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows.iter().enumerate().map(|(i, r)| (i, r.as_slice()))
    }
}

/// Read a window out of a workbook.
///
/// Rows listed in `drop_rows` are removed first, then `skip_rows` leading
/// rows are skipped and at most `max_rows` kept. Every row is padded to the
/// sheet width, so the result is rectangular, and every cell is trimmed.
/// An empty sheet yields an empty window whatever columns are selected.
pub fn read_window(workbook: &dyn Workbook, window: &SheetWindow) -> Result<TableWindow> {
    let raw = workbook
        .sheet_rows(&window.sheet)
        .ok_or_else(|| SheetlintError::SheetNotFound(window.sheet.clone()))?;

    let width = raw.iter().map(|r| r.len()).max().unwrap_or(0);
    if width == 0 {
        debug!(sheet = %window.sheet, "sheet is empty");
        return Ok(TableWindow::from_rows(window.sheet.clone(), Vec::new()));
    }

    if let Some(columns) = &window.columns {
        if let Some(bad) = columns.iter().find(|&&c| c >= width) {
            return Err(SheetlintError::Layout {
                sheet: window.sheet.clone(),
                message: format!(
                    "column index {} is out of range (sheet has {} columns)",
                    bad, width
                ),
            });
        }
    }

    let selected = raw
        .iter()
        .enumerate()
        .filter(|(idx, _)| !window.drop_rows.contains(idx))
        .skip(window.skip_rows)
        .take(window.max_rows.unwrap_or(usize::MAX));

    let mut rows = Vec::new();
    let mut row_numbers = Vec::new();
    for (idx, row) in selected {
        let cell_at = |c: usize| row.get(c).map(Cell::trimmed).unwrap_or(Cell::Absent);
        let cells: Vec<Cell> = match &window.columns {
            Some(columns) => columns.iter().map(|&c| cell_at(c)).collect(),
            None => (0..width).map(cell_at).collect(),
        };
        rows.push(cells);
        row_numbers.push(idx);
    }

    debug!(
        sheet = %window.sheet,
        rows = rows.len(),
        columns = width,
        "read table window"
    );

    Ok(TableWindow {
        sheet: window.sheet.clone(),
        rows,
        row_numbers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemoryWorkbook;

    fn workbook() -> MemoryWorkbook {
        MemoryWorkbook::new().with_sheet(
            "Sheet",
            &[
                &["title row"],
                &["instructions", "x"],
                &["  a  ", "b", "c"],
                &["d", "", " e "],
                &["f"],
            ],
        )
    }

    #[test]
    fn test_read_window_trims_and_pads() {
        let wb = workbook();
        let window = SheetWindow::new("Sheet").with_drop_rows(vec![0, 1]);
        let table = read_window(&wb, &window).unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.get(0, 0), Some(&Cell::Value("a".to_string())));
        assert_eq!(table.get(1, 1), Some(&Cell::Absent));
        assert_eq!(table.get(1, 2), Some(&Cell::Value("e".to_string())));
        assert_eq!(table.get(2, 2), Some(&Cell::Absent));
        assert_eq!(table.sheet_row(0), Some(2));
    }

    #[test]
    fn test_read_window_skip_and_limit() {
        let wb = workbook();
        let window = SheetWindow::new("Sheet").with_skip_rows(1).with_max_rows(2);
        let table = read_window(&wb, &window).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, 0).map(Cell::text), Some("instructions"));
    }

    #[test]
    fn test_read_window_column_subset() {
        let wb = workbook();
        let window = SheetWindow::new("Sheet")
            .with_drop_rows(vec![0, 1])
            .with_columns(vec![2, 0]);
        let table = read_window(&wb, &window).unwrap();
        assert_eq!(table.get(0, 0).map(Cell::text), Some("c"));
        assert_eq!(table.get(0, 1).map(Cell::text), Some("a"));
    }

    #[test]
    fn test_read_window_missing_sheet() {
        let wb = workbook();
        let err = read_window(&wb, &SheetWindow::new("Other")).unwrap_err();
        assert!(matches!(err, SheetlintError::SheetNotFound(name) if name == "Other"));
    }

    #[test]
    fn test_read_window_column_out_of_range() {
        let wb = workbook();
        let window = SheetWindow::new("Sheet").with_columns(vec![0, 3]);
        let err = read_window(&wb, &window).unwrap_err();
        assert!(matches!(err, SheetlintError::Layout { .. }));
    }

    #[test]
    fn test_read_window_empty_sheet_with_columns() {
        let empty: &[&[&str]] = &[];
        let wb = MemoryWorkbook::new().with_sheet("Blank", empty);
        let window = SheetWindow::new("Blank")
            .with_drop_rows(vec![0, 1])
            .with_columns(vec![0, 2, 4]);
        let table = read_window(&wb, &window).unwrap();
        assert_eq!(table.sheet, "Blank");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.rows().count(), 0);
    }
}
