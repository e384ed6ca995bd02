//! Required-field checks against the data dictionary.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::LintConfig;
use crate::error::{Result, SheetlintError};
use crate::model::{CollectionType, Dictionary, EntityRecord, MetadataTree};

use super::observation::{Observation, ObservationType, Severity};
use super::report::ValidationReport;

/// Checks a metadata tree for required fields.
///
/// Two passes run in order. The minimum-required pass fails the run when any
/// listed field is not provided at either level. The dictionary pass records
/// whatever the dictionary flags as required but nobody provided, without
/// failing.
pub struct ValidationEngine<'a> {
    dictionary: &'a Dictionary,
    config: &'a LintConfig,
    subproject_estimate: usize,
}

impl<'a> ValidationEngine<'a> {
    /// Create an engine for one dictionary and configuration.
    pub fn new(dictionary: &'a Dictionary, config: &'a LintConfig) -> Self {
        Self {
            dictionary,
            config,
            subproject_estimate: 0,
        }
    }

    /// Expected number of values for multi-valued fields.
    pub fn with_subproject_estimate(mut self, estimate: usize) -> Self {
        self.subproject_estimate = estimate;
        self
    }

    /// Run both passes.
    pub fn validate(&self, tree: &MetadataTree) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        let minimum: BTreeSet<String> = self.config.minimum_required.iter().cloned().collect();
        let missing = self.check_tree(tree, &minimum, &mut report)?;
        if !missing.is_empty() {
            return Err(SheetlintError::RequiredFieldsMissing {
                fields: missing.into_iter().collect(),
            });
        }

        let required: BTreeSet<String> = self.dictionary.required_fields().into_iter().collect();
        let missing = self.check_tree(tree, &required, &mut report)?;
        for field in &missing {
            report.observe(Observation::new(
                ObservationType::MissingRequired,
                field.clone(),
                format!("Required field ({}) from the data dictionary was not provided", field),
            ));
        }
        report.missing = missing;

        debug!(
            missing = report.missing.len(),
            observations = report.observations.len(),
            "validation finished"
        );
        Ok(report)
    }

    /// Project level first; whatever it leaves missing may be provided by the
    /// samples.
    fn check_tree(
        &self,
        tree: &MetadataTree,
        requirements: &BTreeSet<String>,
        report: &mut ValidationReport,
    ) -> Result<BTreeSet<String>> {
        let project_level = [
            (CollectionType::PiLab, &tree.pi),
            (CollectionType::Project, &tree.project),
        ];
        let missing = self.missing_fields(project_level, requirements, &[], report)?;

        let sample_level = tree
            .samples
            .values()
            .map(|record| (CollectionType::Sample, record));
        let sample_key = self.config.sample.key_label.as_str();
        self.missing_fields(sample_level, &missing, &[sample_key], report)
    }

    /// Required fields not provided by one level of the tree.
    ///
    /// Every sample is checked against the single `Sample` schema. A field
    /// that is required (flagged in the dictionary or listed in
    /// `requirements`) but blank fails immediately, except for multi-valued
    /// fields, which simply do not count as provided. Singular fields holding
    /// more than one value are observed whether required or not.
    pub fn missing_fields<'r>(
        &self,
        level: impl IntoIterator<Item = (CollectionType, &'r EntityRecord)>,
        requirements: &BTreeSet<String>,
        extra_known: &[&str],
        report: &mut ValidationReport,
    ) -> Result<BTreeSet<String>> {
        let mut provided: BTreeSet<&str> = extra_known.iter().copied().collect();

        for (bucket, record) in level {
            for (field, value) in record.iter() {
                let Some(entry) = self.dictionary.get(bucket, field) else {
                    report.observe(
                        Observation::new(
                            ObservationType::UnknownField,
                            field.clone(),
                            format!(
                                "Provided field ({}, {}) is not defined in the data dictionary",
                                bucket, field
                            ),
                        )
                        .with_collection(bucket)
                        .with_severity(Severity::Info),
                    );
                    continue;
                };

                let count = value.provided_count();
                if count > 1 && self.config.is_singular(field) {
                    report.observe(
                        Observation::new(
                            ObservationType::MultipleValues,
                            field.clone(),
                            format!(
                                "Field ({}, {}) takes a single value but {} were provided",
                                bucket, field, count
                            ),
                        )
                        .with_collection(bucket),
                    );
                }

                if !entry.is_required_flag() && !requirements.contains(field) {
                    continue;
                }

                if self.config.is_mvd(field) {
                    if count == 0 {
                        continue;
                    }
                    if count < self.subproject_estimate {
                        report.observe(
                            Observation::new(
                                ObservationType::IncompleteSubprojects,
                                field.clone(),
                                format!(
                                    "Required field ({}) has {} value(s) for an estimated {} sub-projects",
                                    field, count, self.subproject_estimate
                                ),
                            )
                            .with_collection(bucket),
                        );
                    }
                } else if count == 0 {
                    return Err(SheetlintError::RequiredFieldBlank {
                        collection: bucket.to_string(),
                        field: field.clone(),
                    });
                }
                provided.insert(field.as_str());
            }
        }

        Ok(requirements
            .iter()
            .filter(|field| !provided.contains(field.as_str()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DictionaryEntry, FieldValue};

    fn entry(collection: CollectionType, field: &str, required: &str) -> DictionaryEntry {
        DictionaryEntry {
            collection_type: collection,
            field_name: field.to_string(),
            external_name: field.to_lowercase().replace(' ', "_"),
            is_required: required.to_string(),
            description: None,
            example: None,
        }
    }

    fn dictionary(entries: &[(CollectionType, &str, &str)]) -> Dictionary {
        let mut dictionary = Dictionary::new();
        for (collection, field, required) in entries {
            dictionary.insert(entry(*collection, field, required));
        }
        dictionary
    }

    fn list(values: &[&str]) -> FieldValue {
        FieldValue::List(values.iter().map(|s| s.to_string()).collect())
    }

    fn config() -> LintConfig {
        LintConfig::default()
    }

    #[test]
    fn test_clean_tree() {
        let dict = dictionary(&[
            (CollectionType::PiLab, "Data Owner", "Required"),
            (CollectionType::Sample, "Sample ID", "Required"),
        ]);
        let mut tree = MetadataTree::new();
        tree.pi.insert("Data Owner", list(&["Jane Doe"]));
        tree.samples
            .entry("S1".to_string())
            .or_default()
            .insert("Sample ID", "S1");

        let config = config();
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_minimum_required_missing_fails() {
        let dict = dictionary(&[(CollectionType::Sample, "Organism", "Optional")]);
        let mut tree = MetadataTree::new();
        tree.samples.entry("S1".to_string()).or_default();

        let mut config = config();
        config.minimum_required = vec!["Organism".to_string()];
        let err = ValidationEngine::new(&dict, &config).validate(&tree).unwrap_err();
        assert!(matches!(
            err,
            SheetlintError::RequiredFieldsMissing { ref fields } if fields == &["Organism"]
        ));
    }

    #[test]
    fn test_blank_required_sample_field_is_fatal() {
        let dict = dictionary(&[(CollectionType::Sample, "Organism", "Required")]);
        let mut tree = MetadataTree::new();
        tree.samples
            .entry("S1".to_string())
            .or_default()
            .insert("Organism", "Homo sapiens");
        tree.samples
            .entry("S2".to_string())
            .or_default()
            .insert("Organism", "nan");

        let mut config = config();
        config.minimum_required = vec!["Organism".to_string()];
        let err = ValidationEngine::new(&dict, &config).validate(&tree).unwrap_err();
        assert!(matches!(
            err,
            SheetlintError::RequiredFieldBlank { ref collection, ref field }
                if collection == "Sample" && field == "Organism"
        ));
    }

    #[test]
    fn test_requirement_satisfied_at_sample_level() {
        let dict = dictionary(&[
            (CollectionType::Project, "Organism", "Optional"),
            (CollectionType::Sample, "Organism", "Optional"),
        ]);
        let mut tree = MetadataTree::new();
        tree.samples
            .entry("S1".to_string())
            .or_default()
            .insert("Organism", "Homo sapiens");

        let mut config = config();
        config.minimum_required = vec!["Organism".to_string()];
        assert!(ValidationEngine::new(&dict, &config).validate(&tree).is_ok());
    }

    #[test]
    fn test_dictionary_required_residue_is_reported() {
        let dict = dictionary(&[
            (CollectionType::Project, "Project Title", "Required"),
            (CollectionType::Project, "DOI", "Required"),
        ]);
        let mut tree = MetadataTree::new();
        tree.project.insert("Project Title", list(&["RNA-seq"]));

        let config = config();
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        assert_eq!(report.missing.iter().collect::<Vec<_>>(), vec!["DOI"]);
        assert_eq!(report.of_type(ObservationType::MissingRequired).count(), 1);
    }

    #[test]
    fn test_blank_mvd_field_counts_as_missing_not_fatal() {
        let dict = dictionary(&[(CollectionType::Project, "DOI", "Required")]);
        let mut tree = MetadataTree::new();
        tree.project.insert("DOI", list(&["nan", ""]));

        let config = config();
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        assert!(report.missing.contains("DOI"));
    }

    #[test]
    fn test_mvd_field_short_of_subprojects_warns() {
        let dict = dictionary(&[(CollectionType::Project, "Organism(s)", "Required")]);
        let mut tree = MetadataTree::new();
        tree.project
            .insert("Organism(s)", list(&["Homo sapiens", "nan", "Mus musculus"]));

        let config = config();
        let report = ValidationEngine::new(&dict, &config)
            .with_subproject_estimate(3)
            .validate(&tree)
            .unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.of_type(ObservationType::IncompleteSubprojects).count(), 1);
    }

    #[test]
    fn test_unknown_field_warned_once() {
        let dict = dictionary(&[(CollectionType::Sample, "Sample ID", "Required")]);
        let mut tree = MetadataTree::new();
        for id in ["S1", "S2"] {
            let record = tree.samples.entry(id.to_string()).or_default();
            record.insert("Sample ID", id);
            record.insert("Batch", "B1");
        }

        let config = config();
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        let unknown: Vec<_> = report.of_type(ObservationType::UnknownField).collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].field, "Batch");
        assert_eq!(unknown[0].collection, Some(CollectionType::Sample));
        assert_eq!(unknown[0].severity, Severity::Info);
    }

    #[test]
    fn test_singular_field_with_several_values_is_observed() {
        let dict = dictionary(&[
            (CollectionType::Project, "Project Title", "Required"),
            (CollectionType::Project, "Contact Email", "Optional"),
        ]);
        let mut tree = MetadataTree::new();
        tree.project
            .insert("Project Title", list(&["Liver RNA-seq", "nan", "Kidney RNA-seq"]));
        tree.project.insert("Contact Email", list(&["a@nih.gov", "b@nih.gov"]));

        let config = config();
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        let multiple: Vec<_> = report.of_type(ObservationType::MultipleValues).collect();
        assert_eq!(multiple.len(), 2);
        assert_eq!(multiple[0].field, "Contact Email");
        assert_eq!(multiple[0].collection, Some(CollectionType::Project));
        assert_eq!(multiple[0].severity, Severity::Warning);
        assert!(multiple[1].description.contains("2 were provided"));
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_configured_mvd_fields_drive_blank_handling() {
        let dict = dictionary(&[(CollectionType::Project, "Grant Number", "Required")]);
        let mut tree = MetadataTree::new();
        tree.project.insert("Grant Number", list(&["nan"]));

        let config = config();
        assert!(!config.is_mvd("Grant Number"));
        let err = ValidationEngine::new(&dict, &config).validate(&tree).unwrap_err();
        assert!(matches!(err, SheetlintError::RequiredFieldBlank { .. }));

        let mut config = config;
        config.mvd_fields.push("Grant Number".to_string());
        let report = ValidationEngine::new(&dict, &config).validate(&tree).unwrap();
        assert!(report.missing.contains("Grant Number"));
    }
}
