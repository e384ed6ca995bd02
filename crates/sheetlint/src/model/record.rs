//! Entity records and the three-level metadata tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetlintError};

use super::types::{CollectionType, FieldValue, MergePolicy};

/// Fields of one collection instance, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl EntityRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// True if the field is set (even to absent markers).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// True if the field is unset or carries no value.
    pub fn is_unset(&self, field: &str) -> bool {
        self.fields.get(field).is_none_or(FieldValue::is_absent)
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge another record into this one.
    pub fn merge(&mut self, other: EntityRecord, policy: MergePolicy) {
        for (field, value) in other.fields {
            match policy {
                MergePolicy::Update => {
                    self.fields.insert(field, value);
                }
                MergePolicy::Preserve => {
                    if self.is_unset(&field) {
                        self.fields.insert(field, value);
                    }
                }
            }
        }
    }
}

impl FromIterator<(String, FieldValue)> for EntityRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The assembled metadata: one PI record, one Project record, many samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTree {
    pub pi: EntityRecord,
    pub project: EntityRecord,
    pub samples: BTreeMap<String, EntityRecord>,
}

impl MetadataTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for a single-instance collection (PI_Lab or Project).
    pub fn collection(&self, collection: CollectionType) -> Option<&EntityRecord> {
        match collection {
            CollectionType::PiLab => Some(&self.pi),
            CollectionType::Project => Some(&self.project),
            CollectionType::Sample => None,
        }
    }

    /// Mutable record for a single-instance collection (PI_Lab or Project).
    pub fn collection_mut(&mut self, collection: CollectionType) -> Option<&mut EntityRecord> {
        match collection {
            CollectionType::PiLab => Some(&mut self.pi),
            CollectionType::Project => Some(&mut self.project),
            CollectionType::Sample => None,
        }
    }

    /// Number of declared samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Merge additional PI_Lab or Project metadata.
    pub fn merge_collection(
        &mut self,
        collection: CollectionType,
        additions: EntityRecord,
        policy: MergePolicy,
    ) -> Result<()> {
        let record = self.collection_mut(collection).ok_or_else(|| {
            SheetlintError::Config(
                "sample metadata must be merged with merge_samples".to_string(),
            )
        })?;
        record.merge(additions, policy);
        Ok(())
    }

    /// Merge additional sample metadata.
    ///
    /// Every sample id must already be declared. When any is not, nothing is
    /// written and the error names all unknown ids.
    pub fn merge_samples(
        &mut self,
        additions: BTreeMap<String, EntityRecord>,
        policy: MergePolicy,
    ) -> Result<()> {
        let unknown: Vec<String> = additions
            .keys()
            .filter(|id| !self.samples.contains_key(*id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SheetlintError::UnknownSampleReference { sample_ids: unknown });
        }

        for (id, record) in additions {
            if let Some(existing) = self.samples.get_mut(&id) {
                existing.merge(record, policy);
            }
        }
        Ok(())
    }

    /// The `project.json` document: PI_Lab and Project records by collection.
    pub fn project_document(&self) -> BTreeMap<CollectionType, &EntityRecord> {
        let mut doc = BTreeMap::new();
        doc.insert(CollectionType::PiLab, &self.pi);
        doc.insert(CollectionType::Project, &self.project);
        doc
    }
}
