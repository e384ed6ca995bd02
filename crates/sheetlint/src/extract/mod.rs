//! Section extractors: turn table windows into normalized tuples.
//!
//! Each extractor is a lazy iterator over one [`TableWindow`](crate::input::TableWindow):
//!
//! - [`DictionaryExtractor`] reads the data dictionary into [`DictionaryEntry`](crate::model::DictionaryEntry) values.
//! - [`BlockExtractor`] reads key/value-list blocks (PI and Project sections).
//! - [`RecordExtractor`] reads keyed multi-record tables (the Sample section).

mod block;
mod dictionary;
mod records;

pub use block::{BlockExtractor, BlockTuple};
pub use dictionary::DictionaryExtractor;
pub use records::{RecordExtractor, RecordTuple};

use crate::input::is_absent;

/// Remove trailing absent values, keeping interior gaps.
///
/// `["nan", "1", "2", "nan", "nan"]` becomes `["nan", "1", "2"]`.
pub fn strip_trailing_absent(mut values: Vec<String>) -> Vec<String> {
    while values.last().is_some_and(|v| is_absent(v)) {
        values.pop();
    }
    values
}
