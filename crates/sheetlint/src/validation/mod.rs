//! Validation engine for required metadata fields.

mod engine;
mod observation;
mod report;

pub use engine::ValidationEngine;
pub use observation::{Observation, ObservationType, Severity};
pub use report::ValidationReport;
