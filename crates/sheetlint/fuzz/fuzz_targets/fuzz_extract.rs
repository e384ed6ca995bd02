//! Fuzz target for the extraction pipeline.
//!
//! The input is split into three sheets on form feeds, rows on newlines and
//! cells on tabs. Linting must return a result or an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sheetlint::input::Cell;
use sheetlint::{AuditLog, Linter, MemoryWorkbook};

const SHEETS: [&str; 3] = ["Data Dictionary", "Project Template", "Sample Template"];

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let text = String::from_utf8_lossy(data);
    let mut workbook = MemoryWorkbook::new();
    for (name, sheet) in SHEETS.iter().zip(text.split('\x0c')) {
        let rows = sheet
            .lines()
            .map(|line| line.split('\t').map(Cell::from_text).collect())
            .collect();
        workbook.add_sheet(*name, rows);
    }

    let linter = Linter::new();
    let _ = linter.lint(&workbook, &AuditLog::disabled(), false);
    let _ = linter.lint(&workbook, &AuditLog::disabled(), true);
});
