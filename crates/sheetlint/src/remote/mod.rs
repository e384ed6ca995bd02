//! Remote metadata store: registration attributes, diffing and the client.

mod client;
mod diff;

use serde::{Deserialize, Serialize};

pub use client::{fetch_or_empty, DmeClient, RemoteStore};
pub use diff::{diff_attributes, AttributeDiff, ValueChange};

use crate::input::is_absent;
use crate::model::{CollectionType, Dictionary, EntityRecord};

/// One (attribute, value) pair as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute: String,
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// A registration metadata file: `{"metadataEntries": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntries {
    #[serde(rename = "metadataEntries")]
    pub metadata_entries: Vec<Attribute>,
}

impl MetadataEntries {
    /// Value of an attribute, if present.
    pub fn value(&self, attribute: &str) -> Option<&str> {
        self.metadata_entries
            .iter()
            .find(|a| a.attribute == attribute)
            .map(|a| a.value.as_str())
    }
}

impl EntityRecord {
    /// Render the record as registration attributes.
    ///
    /// Fields declared in the dictionary use their external name. List values
    /// are joined with `", "`, skipping absent entries; fields without any
    /// value are left out.
    pub fn to_attributes(&self, collection: CollectionType, dictionary: &Dictionary) -> Vec<Attribute> {
        self.iter()
            .filter_map(|(field, value)| {
                let joined = value
                    .values()
                    .iter()
                    .filter(|v| !is_absent(v))
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if joined.is_empty() {
                    return None;
                }
                let name = dictionary
                    .external_name(collection, field)
                    .filter(|name| !is_absent(name))
                    .unwrap_or(field.as_str());
                Some(Attribute::new(name, joined))
            })
            .collect()
    }
}
