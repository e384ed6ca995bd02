//! Metadata Assembler: folds extractor tuples into the metadata tree.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::audit::StageLog;
use crate::config::{DictionaryLayout, MarkerSet, SectionLayout};
use crate::error::{Result, SheetlintError};
use crate::extract::{BlockExtractor, DictionaryExtractor, RecordExtractor};
use crate::input::TableWindow;
use crate::model::{CollectionType, Dictionary, EntityRecord, FieldValue};

/// Build the data dictionary. Duplicate (collection, field) rows keep the last
/// occurrence.
pub fn assemble_dictionary(
    window: &TableWindow,
    layout: &DictionaryLayout,
    markers: &MarkerSet,
    log: &mut StageLog,
) -> Result<Dictionary> {
    let mut dictionary = Dictionary::new();
    for entry in DictionaryExtractor::new(window, layout, markers)? {
        let entry = entry?;
        log.record([
            entry.collection_type.as_str(),
            entry.field_name.as_str(),
            entry.external_name.as_str(),
            entry.is_required.as_str(),
        ])?;
        dictionary.insert(entry);
    }
    debug!(fields = dictionary.len(), "assembled data dictionary");
    Ok(dictionary)
}

/// PI and Project records from the project block.
#[derive(Debug, Clone, Default)]
pub struct ProjectAssembly {
    pub pi: EntityRecord,
    pub project: EntityRecord,
    /// Non-absent value count of each field row, in sheet order.
    pub value_counts: IndexMap<String, usize>,
}

impl ProjectAssembly {
    /// Rough number of sub-projects described: the third-largest value count,
    /// or the largest when fewer than three fields were read.
    pub fn subproject_estimate(&self) -> usize {
        let mut counts: Vec<usize> = self.value_counts.values().copied().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        counts.get(2).or(counts.first()).copied().unwrap_or(0)
    }
}

/// Build the PI and Project records. Values are always lists.
pub fn assemble_project(
    window: &TableWindow,
    layout: &SectionLayout,
    markers: &MarkerSet,
    log: &mut StageLog,
) -> Result<ProjectAssembly> {
    let mut assembly = ProjectAssembly::default();

    for tuple in BlockExtractor::new(window, layout, markers) {
        let tuple = tuple?;
        log.record(
            [tuple.collection_type.as_str(), tuple.field.as_str()]
                .into_iter()
                .chain(tuple.values.iter().map(String::as_str)),
        )?;

        let value = FieldValue::List(tuple.values);
        assembly
            .value_counts
            .insert(tuple.field.clone(), value.provided_count());

        let record = match tuple.collection_type {
            CollectionType::PiLab => &mut assembly.pi,
            CollectionType::Project => &mut assembly.project,
            CollectionType::Sample => {
                return Err(SheetlintError::Layout {
                    sheet: window.sheet.clone(),
                    message: format!(
                        "field '{}' is tagged Sample; sample metadata belongs in the sample table",
                        tuple.field
                    ),
                });
            }
        };
        record.insert(tuple.field, value);
    }

    debug!(
        pi_fields = assembly.pi.len(),
        project_fields = assembly.project.len(),
        "assembled project block"
    );
    Ok(assembly)
}

/// Build sample records keyed by sample id. Later writes for the same
/// (sample, field) overwrite earlier ones.
pub fn assemble_samples(
    window: &TableWindow,
    key_label: &str,
    markers: &MarkerSet,
    log: &mut StageLog,
) -> Result<BTreeMap<String, EntityRecord>> {
    let mut samples: BTreeMap<String, EntityRecord> = BTreeMap::new();
    for tuple in RecordExtractor::new(window, key_label, markers)? {
        log.record([
            tuple.sample_id.as_str(),
            tuple.field.as_str(),
            tuple.value.as_str(),
        ])?;
        samples
            .entry(tuple.sample_id)
            .or_default()
            .insert(tuple.field, tuple.value);
    }
    debug!(samples = samples.len(), sheet = %window.sheet, "assembled sample table");
    Ok(samples)
}

/// Build one PI or Project record from an additional key/value sheet.
pub fn assemble_block(
    window: &TableWindow,
    collection: CollectionType,
    markers: &MarkerSet,
) -> Result<EntityRecord> {
    let layout = SectionLayout::Fixed { collection };
    BlockExtractor::new(window, &layout, markers)
        .map(|tuple| tuple.map(|t| (t.field, FieldValue::List(t.values))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditLog, AuditStage};
    use crate::input::Cell;

    fn window(sheet: &str, rows: &[&[&str]]) -> TableWindow {
        TableWindow::from_rows(
            sheet,
            rows.iter()
                .map(|r| r.iter().map(|s| Cell::from_text(s)).collect())
                .collect(),
        )
    }

    fn no_log() -> StageLog {
        AuditLog::disabled().stage(AuditStage::Project).unwrap()
    }

    #[test]
    fn test_dictionary_last_occurrence_wins() {
        let table = window(
            "Data Dictionary",
            &[
                &["Sample Collection", "", "", ""],
                &["Optional", "Organism", "organism_v1"],
                &["Required", "Organism", "organism"],
            ],
        );
        let dictionary = assemble_dictionary(
            &table,
            &DictionaryLayout::default(),
            &MarkerSet::default(),
            &mut no_log(),
        )
        .unwrap();

        let entry = dictionary.get(CollectionType::Sample, "Organism").unwrap();
        assert_eq!(entry.external_name, "organism");
        assert!(entry.is_required_flag());
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn test_project_assembly_counts() {
        let table = window(
            "Project Template",
            &[
                &["PI_Lab Collection", "PI_Lab", "", ""],
                &["PI Name", "Jane Doe", "", ""],
                &["Project Collection", "Project", "", ""],
                &["Project Title", "RNA-seq", "", ""],
                &["Organism(s)", "Homo sapiens", "Mus musculus", ""],
                &["Platform Name", "Illumina", "nan", "Illumina"],
            ],
        );
        let assembly = assemble_project(
            &table,
            &SectionLayout::Markers,
            &MarkerSet::default(),
            &mut no_log(),
        )
        .unwrap();

        assert_eq!(
            assembly.pi.get("PI Name"),
            Some(&FieldValue::List(vec!["Jane Doe".to_string()]))
        );
        assert_eq!(
            assembly.project.get("Platform Name").unwrap().values(),
            ["Illumina", "nan", "Illumina"]
        );
        assert_eq!(assembly.value_counts["Organism(s)"], 2);
        assert_eq!(assembly.value_counts["Platform Name"], 2);
        // counts sorted descending: 2, 2, 1, 1
        assert_eq!(assembly.subproject_estimate(), 1);
    }

    #[test]
    fn test_subproject_estimate_with_few_fields() {
        let mut assembly = ProjectAssembly::default();
        assert_eq!(assembly.subproject_estimate(), 0);
        assembly.value_counts.insert("A".to_string(), 1);
        assembly.value_counts.insert("B".to_string(), 3);
        assert_eq!(assembly.subproject_estimate(), 3);
    }

    #[test]
    fn test_project_block_rejects_sample_section() {
        let table = window(
            "Project Template",
            &[&["Sample Collection", "Sample"], &["Organism", "Homo sapiens"]],
        );
        let err = assemble_project(
            &table,
            &SectionLayout::Markers,
            &MarkerSet::default(),
            &mut no_log(),
        )
        .unwrap_err();
        assert!(matches!(err, SheetlintError::Layout { .. }));
    }

    #[test]
    fn test_sample_later_write_wins() {
        let table = window(
            "Sample Template",
            &[
                &["Sample ID", "Organism"],
                &["S1", "Homo sapiens"],
                &["S1", "Mus musculus"],
                &["S2", ""],
            ],
        );
        let samples =
            assemble_samples(&table, "Sample ID", &MarkerSet::default(), &mut no_log()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples["S1"].get("Organism"), Some(&FieldValue::from("Mus musculus")));
        assert_eq!(samples["S2"].get("Organism"), Some(&FieldValue::from("nan")));
        assert_eq!(samples["S2"].get("Sample ID"), Some(&FieldValue::from("S2")));
    }

    #[test]
    fn test_assemble_block_fixed_collection() {
        let table = window("Extra Project", &[&["Batch", "B1", "B2"], &["Optional fields", ""]]);
        let record = assemble_block(&table, CollectionType::Project, &MarkerSet::default()).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Batch").unwrap().values(), ["B1", "B2"]);
    }
}
