//! Sheetlint: schema-driven metadata extraction for project request workbooks.
//!
//! A workbook carries a Data Dictionary sheet that declares every field, a
//! Project Template describing the PI lab and project, and a Sample Template
//! with one row per sample. Sheetlint reads the three sheets, assembles a
//! PI_Lab → Project → Sample metadata tree, propagates values between the
//! levels and checks the result against the dictionary.
//!
//! # Core Principles
//!
//! - **Declarative layouts**: Sheet names, skipped rows and markers live in [`LintConfig`]
//! - **Non-destructive**: The workbook is never modified
//! - **Auditable**: Every parsed tuple can be logged per stage
//!
//! # Example
//!
//! ```no_run
//! use sheetlint::Linter;
//!
//! let linter = Linter::new();
//! let result = linter.lint_file("request.xlsx", None, false).unwrap();
//!
//! println!("Samples: {}", result.tree.sample_count());
//! println!("Missing: {:?}", result.report.missing);
//! result.write_outputs("out").unwrap();
//! ```

pub mod assemble;
pub mod audit;
pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod model;
pub mod output;
pub mod propagate;
pub mod register;
pub mod remote;
pub mod validation;

mod linter;

pub use crate::linter::{
    LintResult, LintSummary, Linter, DICTIONARY_FILE, METADATA_DIR, PROJECT_FILE, SAMPLE_FILE,
    VALIDATION_FILE,
};
pub use audit::{AuditLog, AuditStage};
pub use config::{EntityNames, LintConfig, SheetWindow};
pub use error::{ErrorKind, Result, SheetlintError};
pub use input::{load_workbook, MemoryWorkbook, SourceMetadata, Workbook};
pub use model::{CollectionType, Dictionary, DictionaryEntry, EntityRecord, FieldValue, MergePolicy, MetadataTree};
pub use validation::{Observation, ObservationType, Severity, ValidationReport};
