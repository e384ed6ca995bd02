//! Error types for the sheetlint library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sheetlint operations.
#[derive(Debug, Error)]
pub enum SheetlintError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input workbook or metadata file does not exist.
    #[error("Failed to open '{}': input file not accessible", path.display())]
    FileNotFound { path: PathBuf },

    /// A single sheet requested by a window is not in the workbook.
    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    /// The workbook lacks one or more of the required sheets.
    #[error("Spreadsheet is missing the following sheet(s): {}", sheets.join(", "))]
    MissingSheets { sheets: Vec<String> },

    /// A window references cells outside the sheet.
    #[error("Layout error in sheet '{sheet}': {message}")]
    Layout { sheet: String, message: String },

    /// The data dictionary (or a section marker layout) is malformed.
    #[error("Data dictionary error at row {row}: {message}")]
    DictionarySchema { row: usize, message: String },

    /// The keyed section has no header row carrying the key label.
    #[error("Sheet '{sheet}' has no header row containing '{label}'")]
    RequiredHeaderMissing { sheet: String, label: String },

    /// A collection type name is not one of PI_Lab, Project or Sample.
    #[error("Unknown collection type '{0}' (expected PI_Lab, Project or Sample)")]
    UnknownCollectionType(String),

    /// An additional sheet references samples absent from the Sample section.
    #[error("Additional metadata references undeclared sample(s): {}", sample_ids.join(", "))]
    UnknownSampleReference { sample_ids: Vec<String> },

    /// A required field was present but every value was blank.
    #[error("Failed to provide required field ({field}) in {collection}")]
    RequiredFieldBlank { collection: String, field: String },

    /// The minimum-required pass found fields nobody provided.
    #[error("Failed to provide required field(s): {}", fields.join(", "))]
    RequiredFieldsMissing { fields: Vec<String> },

    /// Error from the spreadsheet reader.
    #[error("Workbook error for '{}': {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote metadata store could not be queried.
    #[error("Remote store error: {0}")]
    Remote(String),

    /// An external registration command failed.
    #[error("Command '{command}' failed: {message}")]
    ExternalCommand { command: String, message: String },
}

/// Coarse classification of errors, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File or sheet missing.
    InputNotFound,
    /// Malformed dictionary, layout or missing header.
    Schema,
    /// Additional-sheet merge targeting an undeclared sample.
    UnknownSampleReference,
    /// Required field not provided.
    RequiredFieldMissing,
    /// Remote store unavailable.
    Remote,
    /// External command failed.
    External,
    /// IO, serialization and configuration failures.
    Internal,
}

impl SheetlintError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SheetlintError::FileNotFound { .. }
            | SheetlintError::SheetNotFound(_)
            | SheetlintError::MissingSheets { .. } => ErrorKind::InputNotFound,
            SheetlintError::Layout { .. }
            | SheetlintError::DictionarySchema { .. }
            | SheetlintError::RequiredHeaderMissing { .. }
            | SheetlintError::UnknownCollectionType(_) => ErrorKind::Schema,
            SheetlintError::UnknownSampleReference { .. } => ErrorKind::UnknownSampleReference,
            SheetlintError::RequiredFieldBlank { .. }
            | SheetlintError::RequiredFieldsMissing { .. } => ErrorKind::RequiredFieldMissing,
            SheetlintError::Remote(_) => ErrorKind::Remote,
            SheetlintError::ExternalCommand { .. } => ErrorKind::External,
            SheetlintError::Io { .. }
            | SheetlintError::Workbook { .. }
            | SheetlintError::Csv(_)
            | SheetlintError::Json(_)
            | SheetlintError::Regex(_)
            | SheetlintError::Config(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for sheetlint operations.
pub type Result<T> = std::result::Result<T, SheetlintError>;
