//! The data dictionary: per-collection field declarations.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::types::CollectionType;

/// Declaration of one field in the data dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub collection_type: CollectionType,
    pub field_name: String,
    /// Attribute name used by the remote metadata store.
    pub external_name: String,
    /// Raw requirement text: usually `Required` or `Optional`.
    pub is_required: String,
    pub description: Option<String>,
    pub example: Option<String>,
}

impl DictionaryEntry {
    /// True if the entry is flagged as required.
    pub fn is_required_flag(&self) -> bool {
        self.is_required.trim().eq_ignore_ascii_case("required")
    }
}

/// Field declarations by collection type, then by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: BTreeMap<CollectionType, BTreeMap<String, DictionaryEntry>>,
    order: Vec<(CollectionType, String)>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A later entry for the same (collection, field) replaces
    /// the earlier one.
    pub fn insert(&mut self, entry: DictionaryEntry) {
        let fields = self.entries.entry(entry.collection_type).or_default();
        if !fields.contains_key(&entry.field_name) {
            self.order
                .push((entry.collection_type, entry.field_name.clone()));
        }
        fields.insert(entry.field_name.clone(), entry);
    }

    /// Look up a field declaration.
    pub fn get(&self, collection: CollectionType, field: &str) -> Option<&DictionaryEntry> {
        self.entries.get(&collection)?.get(field)
    }

    /// Declarations of one collection type.
    pub fn fields(&self, collection: CollectionType) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries
            .get(&collection)
            .into_iter()
            .flat_map(|fields| fields.values())
    }

    /// External name for a field, if declared.
    pub fn external_name(&self, collection: CollectionType, field: &str) -> Option<&str> {
        self.get(collection, field).map(|e| e.external_name.as_str())
    }

    /// Fields flagged as required, in the order they first appeared.
    pub fn required_fields(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|(collection, field)| self.get(*collection, field))
            .filter(|entry| entry.is_required_flag())
            .map(|entry| entry.field_name.clone())
            .collect()
    }

    /// Total number of declared fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Serialized as `{collection: {field: [external_name, is_required]}}`.
impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (collection, fields) in &self.entries {
            let pairs: BTreeMap<&str, [&str; 2]> = fields
                .iter()
                .map(|(name, e)| (name.as_str(), [e.external_name.as_str(), e.is_required.as_str()]))
                .collect();
            map.serialize_entry(collection, &pairs)?;
        }
        map.end()
    }
}
