//! Workbook input: loaders, cells and the table window reader.

mod loader;
mod source;
mod window;

pub use loader::{load_workbook, write_sheets_as_tsv};
pub use source::{is_absent, Cell, MemoryWorkbook, SourceMetadata, Workbook, ABSENT};
pub(crate) use source::ABSENT_CELL;
pub use window::{read_window, TableWindow};
