//! Remote Diff Engine: compare local attributes with the remote set.

use std::collections::HashMap;

use serde::Serialize;

use super::Attribute;

/// A shared attribute whose value would change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub attribute: String,
    pub remote: String,
    pub local: String,
}

/// Classification of attributes between the remote store and local metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeDiff {
    /// Attribute names only present remotely.
    pub remote_only: Vec<String>,
    /// Attributes that would be appended, with their local values.
    pub local_only: Vec<Attribute>,
    /// Attribute names present on both sides.
    pub shared: Vec<String>,
    /// Shared attributes whose values differ.
    pub changed: Vec<ValueChange>,
}

impl AttributeDiff {
    /// True if registering the local attributes would change nothing.
    pub fn is_unchanged(&self) -> bool {
        self.local_only.is_empty() && self.changed.is_empty()
    }
}

/// Classify attributes. Order follows each input list; for repeated
/// attribute names the first occurrence counts.
pub fn diff_attributes(remote: &[Attribute], local: &[Attribute]) -> AttributeDiff {
    let mut remote_values: HashMap<&str, &str> = HashMap::new();
    for attr in remote {
        remote_values
            .entry(attr.attribute.as_str())
            .or_insert(attr.value.as_str());
    }
    let mut local_values: HashMap<&str, &str> = HashMap::new();
    for attr in local {
        local_values
            .entry(attr.attribute.as_str())
            .or_insert(attr.value.as_str());
    }

    let mut diff = AttributeDiff::default();

    for attr in remote {
        if !local_values.contains_key(attr.attribute.as_str())
            && !diff.remote_only.contains(&attr.attribute)
        {
            diff.remote_only.push(attr.attribute.clone());
        }
    }

    for attr in local {
        let name = attr.attribute.as_str();
        if diff.shared.iter().any(|s| s == name)
            || diff.local_only.iter().any(|a| a.attribute == name)
        {
            continue;
        }
        match remote_values.get(name) {
            Some(remote_value) => {
                diff.shared.push(attr.attribute.clone());
                if *remote_value != attr.value {
                    diff.changed.push(ValueChange {
                        attribute: attr.attribute.clone(),
                        remote: remote_value.to_string(),
                        local: attr.value.clone(),
                    });
                }
            }
            None => diff.local_only.push(attr.clone()),
        }
    }

    diff
}
