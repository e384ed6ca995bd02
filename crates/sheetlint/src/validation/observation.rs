//! Observation types for non-fatal metadata issues.

use serde::{Deserialize, Serialize};

use crate::model::CollectionType;

/// Type of observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationType {
    /// Field present in the workbook but not declared in the dictionary.
    UnknownField,
    /// Dictionary-required field nobody provided.
    MissingRequired,
    /// Multi-valued field with fewer values than described sub-projects.
    IncompleteSubprojects,
    /// A propagation rule could not be applied.
    Propagation,
    /// Single-valued field given more than one value.
    MultipleValues,
}

impl ObservationType {
    /// Get a human-readable label for the observation type.
    pub fn label(&self) -> &'static str {
        match self {
            ObservationType::UnknownField => "Unknown Field",
            ObservationType::MissingRequired => "Missing Required Field",
            ObservationType::IncompleteSubprojects => "Incomplete Sub-projects",
            ObservationType::Propagation => "Propagation",
            ObservationType::MultipleValues => "Multiple Values",
        }
    }
}

/// Severity level of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only.
    Info,
    /// Should be reviewed before registration.
    Warning,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
        }
    }
}

/// An observation about the extracted metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "type")]
    pub observation_type: ObservationType,
    pub severity: Severity,
    /// Collection the field was checked in, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionType>,
    pub field: String,
    /// Human-readable description.
    pub description: String,
}

impl Observation {
    /// Create a new warning-level observation.
    pub fn new(
        observation_type: ObservationType,
        field: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            observation_type,
            severity: Severity::Warning,
            collection: None,
            field: field.into(),
            description: description.into(),
        }
    }

    /// Set the collection.
    pub fn with_collection(mut self, collection: CollectionType) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// True if both observations describe the same issue on the same field.
    pub fn same_issue(&self, other: &Observation) -> bool {
        self.observation_type == other.observation_type
            && self.collection == other.collection
            && self.field == other.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_observation() {
        let obs = Observation::new(
            ObservationType::UnknownField,
            "Batch",
            "Provided field (Sample, Batch) is not defined in the data dictionary",
        )
        .with_collection(CollectionType::Sample);

        assert_eq!(obs.severity, Severity::Warning);
        assert_eq!(obs.collection, Some(CollectionType::Sample));
        assert_eq!(obs.observation_type.label(), "Unknown Field");
    }

    #[test]
    fn test_same_issue_ignores_description() {
        let a = Observation::new(ObservationType::UnknownField, "Batch", "one");
        let b = Observation::new(ObservationType::UnknownField, "Batch", "two");
        let c = b.clone().with_collection(CollectionType::Project);
        assert!(a.same_issue(&b));
        assert!(!a.same_issue(&c));
    }

    #[test]
    fn test_serialized_shape() {
        let obs = Observation::new(ObservationType::MissingRequired, "DOI", "missing")
            .with_severity(Severity::Info);
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["type"], "missing_required");
        assert_eq!(json["severity"], "info");
        assert!(json.get("collection").is_none());
    }
}
