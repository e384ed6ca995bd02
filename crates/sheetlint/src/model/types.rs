//! Core type definitions for the metadata hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetlintError};
use crate::input::is_absent;

/// Hierarchy level a field or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollectionType {
    /// Organization / principal investigator lab.
    #[serde(rename = "PI_Lab")]
    PiLab,
    /// Project (may describe several sub-projects).
    Project,
    /// One biological sample.
    Sample,
}

impl CollectionType {
    /// Name used in dictionaries and output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::PiLab => "PI_Lab",
            CollectionType::Project => "Project",
            CollectionType::Sample => "Sample",
        }
    }

    /// Parse a collection type name as it appears in a sheet.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "pi_lab" | "pi" | "lab" | "pi-lab" | "organization" => Ok(CollectionType::PiLab),
            "project" => Ok(CollectionType::Project),
            "sample" => Ok(CollectionType::Sample),
            _ => Err(SheetlintError::UnknownCollectionType(name.trim().to_string())),
        }
    }
}

impl FromStr for CollectionType {
    type Err = SheetlintError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a field: a single string or an ordered list of strings.
///
/// Project-level values are always lists (one entry per sub-project), sample
/// values are single strings. A field that was never set is simply not in the
/// record; an absent cell inside a list is kept as the `nan` marker so that
/// sub-project positions stay aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    List(Vec<String>),
}

impl FieldValue {
    /// All entries as a slice.
    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::Single(v) => std::slice::from_ref(v),
            FieldValue::List(v) => v,
        }
    }

    /// First entry, read literally (absent markers included).
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(|s| s.as_str())
    }

    /// Number of entries that carry a value.
    pub fn provided_count(&self) -> usize {
        self.values().iter().filter(|v| !is_absent(v)).count()
    }

    /// True when no entry carries a value.
    pub fn is_absent(&self) -> bool {
        self.provided_count() == 0
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

/// How an additional sheet is merged into an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Every incoming field overwrites the destination.
    #[default]
    Update,
    /// Only fields absent in the destination are filled.
    Preserve,
}
