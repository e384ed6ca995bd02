//! Data model for the PI_Lab → Project → Sample metadata hierarchy.

mod dictionary;
mod record;
mod types;

pub use dictionary::{Dictionary, DictionaryEntry};
pub use record::{EntityRecord, MetadataTree};
pub use types::{CollectionType, FieldValue, MergePolicy};
