//! Workbook loaders: spreadsheets via calamine, sheet directories via csv.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, SheetlintError};

use super::source::{Cell, MemoryWorkbook, SourceMetadata, Workbook};

/// Spreadsheet extensions handled by calamine.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Extensions treated as per-sheet tab-separated files.
const SHEET_FILE_EXTENSIONS: &[&str] = &["tsv", "txt"];

/// Load a workbook from a spreadsheet file or a directory of TSV sheets.
pub fn load_workbook(path: impl AsRef<Path>) -> Result<(MemoryWorkbook, SourceMetadata)> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SheetlintError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_dir() {
        return load_sheet_directory(path);
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        load_spreadsheet(path, &extension)
    } else {
        Err(SheetlintError::Workbook {
            path: path.to_path_buf(),
            message: format!(
                "unsupported format '{}' (expected one of {} or a directory of .tsv sheets)",
                extension,
                SPREADSHEET_EXTENSIONS.join(", ")
            ),
        })
    }
}

fn load_spreadsheet(path: &Path, extension: &str) -> Result<(MemoryWorkbook, SourceMetadata)> {
    let contents = read_bytes(path)?;
    let hash = format!("sha256:{:x}", Sha256::digest(&contents));

    let mut reader = open_workbook_auto(path).map_err(|e| SheetlintError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut workbook = MemoryWorkbook::new();
    for name in reader.sheet_names() {
        let range = reader
            .worksheet_range(&name)
            .map_err(|e| SheetlintError::Workbook {
                path: path.to_path_buf(),
                message: format!("failed to read sheet '{}': {}", name, e),
            })?;
        workbook.add_sheet(name, range_to_rows(&range));
    }

    let sheet_count = workbook.sheet_names().len();
    debug!(path = %path.display(), sheets = sheet_count, "loaded spreadsheet");

    let source = SourceMetadata::new(
        path.to_path_buf(),
        hash,
        contents.len() as u64,
        extension.to_string(),
        sheet_count,
    );
    Ok((workbook, source))
}

/// Convert a calamine range to rows anchored at cell A1.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Absent; col_offset];
        cells.extend(row.iter().map(data_to_cell));
        rows.push(cells);
    }
    rows
}

/// Render one spreadsheet value as text.
fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Absent,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Value(i.to_string()),
        Data::Float(f) => Cell::Value(format_float(*f)),
        Data::Bool(b) => Cell::Value(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::Value(value.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Value(format_float(dt.as_f64())),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
        Data::Error(e) => Cell::Value(format!("{:?}", e)),
    }
}

/// Integral floats are written without a fractional part.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn load_sheet_directory(dir: &Path) -> Result<(MemoryWorkbook, SourceMetadata)> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| SheetlintError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| SHEET_FILE_EXTENSIONS.contains(&e.to_string_lossy().to_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut workbook = MemoryWorkbook::new();
    let mut hasher = Sha256::new();
    let mut size_bytes = 0u64;

    for file in &files {
        let contents = read_bytes(file)?;
        hasher.update(&contents);
        size_bytes += contents.len() as u64;

        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        workbook.add_sheet(name, parse_tsv(&contents)?);
    }

    let source = SourceMetadata::new(
        dir.to_path_buf(),
        format!("sha256:{:x}", hasher.finalize()),
        size_bytes,
        "tsv".to_string(),
        files.len(),
    );
    Ok((workbook, source))
}

/// Parse tab-separated bytes into cells. Empty fields are absent.
fn parse_tsv(bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(rows)
}

/// Write every sheet of a workbook as `<dir>/<sheet>.tsv`.
///
/// Absent cells are written as empty fields. Returns the written paths.
pub fn write_sheets_as_tsv(workbook: &dyn Workbook, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| SheetlintError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::new();
    for name in workbook.sheet_names() {
        let Some(rows) = workbook.sheet_rows(&name) else {
            continue;
        };
        let path = dir.join(format!("{}.tsv", name.replace(['/', '\\'], "-")));
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(&path)?;
        for row in rows {
            writer.write_record(row.iter().map(|c| match c {
                Cell::Absent => "",
                Cell::Value(v) => v.as_str(),
            }))?;
        }
        writer.flush().map_err(|e| SheetlintError::Io {
            path: path.clone(),
            source: e,
        })?;
        written.push(path);
    }
    Ok(written)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| SheetlintError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| SheetlintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(contents)
}
