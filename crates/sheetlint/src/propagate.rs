//! Cross-Propagation Engine: copies, aggregates and computed defaults.
//!
//! Rules run in a fixed order once every additional sheet has been merged:
//! downward copies, upward aggregation, literal defaults, the summary
//! sentence and finally the total sample count.

use indexmap::IndexMap;
use tracing::debug;

use crate::config::PropagationRules;
use crate::input::is_absent;
use crate::model::{CollectionType, EntityRecord, FieldValue, MetadataTree};
use crate::validation::{Observation, ObservationType};

/// Apply every propagation rule to the tree. Returns rules that could not be
/// applied.
pub fn propagate(tree: &mut MetadataTree, rules: &PropagationRules) -> Vec<Observation> {
    let mut skipped = Vec::new();

    for copy in &rules.downward {
        let Some(value) = tree
            .project
            .get(&copy.project_field)
            .and_then(FieldValue::first)
            .map(str::to_string)
        else {
            skipped.push(
                Observation::new(
                    ObservationType::Propagation,
                    copy.sample_field.clone(),
                    format!(
                        "Project field ({}) is not set; not copied to samples",
                        copy.project_field
                    ),
                )
                .with_collection(CollectionType::Sample),
            );
            continue;
        };
        for sample in tree.samples.values_mut() {
            sample.insert(copy.sample_field.clone(), value.clone());
        }
    }

    for field in &rules.upward {
        let value = most_frequent(
            tree.samples
                .values()
                .filter_map(|s| s.get(field))
                .flat_map(FieldValue::values)
                .map(String::as_str),
        );
        debug!(field = %field, value = %value, "aggregated sample field");
        tree.project.insert(field.clone(), vec![value]);
    }

    for default in &rules.defaults {
        match default.level {
            CollectionType::Sample => {
                for sample in tree.samples.values_mut() {
                    set_if_unset(sample, &default.field, FieldValue::from(default.value.as_str()));
                }
            }
            level => {
                if let Some(record) = tree.collection_mut(level) {
                    set_if_unset(record, &default.field, vec![default.value.clone()].into());
                }
            }
        }
    }

    if let Some(rule) = &rules.summary {
        let sentence = summarize(tree, &rule.fields);
        set_if_unset(&mut tree.project, &rule.field, vec![sentence].into());
    }

    if let Some(field) = &rules.sample_count_field {
        let count = tree.sample_count().to_string();
        set_if_unset(&mut tree.project, field, vec![count].into());
    }

    skipped
}

fn set_if_unset(record: &mut EntityRecord, field: &str, value: FieldValue) {
    if record.is_unset(field) {
        record.insert(field, value);
    }
}

/// Most frequent non-absent value.
///
/// A single left-to-right scan keeps a running maximum and replaces it only
/// on a strictly greater count, so among tied values the first one to reach
/// the maximum wins. No values at all yield an empty string.
pub fn most_frequent<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let counts = count_values(values);
    let mut best = ("", 0usize);
    for (value, count) in counts {
        if count > best.1 {
            best = (value, count);
        }
    }
    best.0.to_string()
}

fn count_values<'a>(values: impl IntoIterator<Item = &'a str>) -> IndexMap<&'a str, usize> {
    let mut counts = IndexMap::new();
    for value in values.into_iter().filter(|v| !is_absent(v)) {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Human-readable summary of sample counts per field.
///
/// A field is left out when any sample lacks it or holds an absent value.
pub fn summarize(tree: &MetadataTree, fields: &[String]) -> String {
    let total = tree.sample_count();
    let mut parts = Vec::new();

    for field in fields {
        let values: Option<Vec<&str>> = tree
            .samples
            .values()
            .map(|s| {
                s.get(field)
                    .and_then(FieldValue::first)
                    .filter(|v| !is_absent(v))
            })
            .collect();
        let Some(values) = values else {
            continue;
        };
        let counts = count_values(values);
        if counts.is_empty() {
            continue;
        }
        let listed: Vec<String> = counts
            .iter()
            .map(|(value, count)| format!("{} {}", count, value))
            .collect();
        parts.push(format!("{}: {}", field, listed.join(", ")));
    }

    if parts.is_empty() {
        format!("{} samples.", total)
    } else {
        format!("{} samples. {}", total, parts.join("; "))
    }
}
