//! Integration tests for the lint pipeline.

use std::fs;
use std::path::Path;

use sheetlint::config::{AdditionalSheet, SectionLayout};
use sheetlint::register::plan_registration;
use sheetlint::remote::{diff_attributes, Attribute, MetadataEntries};
use sheetlint::{
    AuditLog, CollectionType, EntityRecord, FieldValue, LintConfig, Linter, MemoryWorkbook,
    MergePolicy, MetadataTree, ObservationType, Severity, SheetWindow, SheetlintError,
    DICTIONARY_FILE, PROJECT_FILE, SAMPLE_FILE, VALIDATION_FILE,
};

const DICTIONARY: &[&[&str]] = &[
    &["Collection Type / Required", "Field", "DME Name", "Description", "Example"],
    &["PI_Lab Collection", "", "", "", ""],
    &["Required", "Data Owner", "owner", "Lab head", "Jane Doe"],
    &["Optional", "Affiliation", "affiliation", "", ""],
    &["Project Collection", "", "", "", ""],
    &["Required", "Project Title", "project_title", "", ""],
    &["Optional", "Access", "access", "", ""],
    &["Optional", "Number of Samples", "number_of_samples", "", ""],
    &["Optional", "Summary of Samples", "summary_of_samples", "", ""],
    &["Sample Collection", "", "", "", ""],
    &["Required", "Sample ID", "sample_id", "", ""],
    &["Required", "Organism", "organism", "", ""],
    &["Optional", "Sample Type", "sample_type", "", ""],
];

const PROJECT: &[&[&str]] = &[
    &["Project Information"],
    &["Optional fields may be left blank"],
    &["PI_Lab Collection", "PI_Lab"],
    &["Data Owner", "Jane Doe"],
    &["Project Collection", "Project"],
    &["Optional field: fill in one column per sub-project"],
    &["Project Title", "Liver RNA-seq"],
];

const SAMPLES: &[&[&str]] = &[
    &["Sample Information"],
    &["One row per sample"],
    &["Sample ID", "Organism", "Sample Type"],
    &["S1", "Homo sapiens", "tumor"],
    &["S2", "Homo sapiens", "normal"],
];

fn workbook_with(samples: &[&[&str]]) -> MemoryWorkbook {
    MemoryWorkbook::new()
        .with_sheet("Data Dictionary", DICTIONARY)
        .with_sheet("Project Template", PROJECT)
        .with_sheet("Sample Template", samples)
}

fn workbook() -> MemoryWorkbook {
    workbook_with(SAMPLES)
}

fn write_tsv(dir: &Path, sheet: &str, rows: &[&[&str]]) {
    let text: String = rows.iter().map(|row| format!("{}\n", row.join("\t"))).collect();
    fs::write(dir.join(format!("{}.tsv", sheet)), text).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn test_data_owner_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let result = Linter::new()
        .lint(&workbook(), &AuditLog::disabled(), false)
        .expect("lint failed");

    assert!(result.report.missing.is_empty());
    result.write_outputs(dir.path()).unwrap();

    let dictionary = read_json(&dir.path().join(DICTIONARY_FILE));
    assert_eq!(
        dictionary["PI_Lab"]["Data Owner"],
        serde_json::json!(["owner", "Required"])
    );

    let project = read_json(&dir.path().join(PROJECT_FILE));
    assert_eq!(project["PI_Lab"]["Data Owner"], serde_json::json!(["Jane Doe"]));
    assert_eq!(
        project["Project"]["Summary of Samples"],
        serde_json::json!(["2 samples. Organism: 2 Homo sapiens; Sample Type: 1 tumor, 1 normal"])
    );
}

#[test]
fn test_lint_sheet_directory_writes_audit_logs() {
    let input = tempfile::tempdir().unwrap();
    write_tsv(input.path(), "Data Dictionary", DICTIONARY);
    write_tsv(input.path(), "Project Template", PROJECT);
    write_tsv(input.path(), "Sample Template", SAMPLES);
    let output = tempfile::tempdir().unwrap();

    let result = Linter::new()
        .lint_file(input.path(), Some(output.path()), false)
        .expect("lint failed");

    let source = result.source.as_ref().unwrap();
    assert_eq!(source.format, "tsv");
    assert_eq!(source.sheet_count, 3);
    assert!(source.hash.starts_with("sha256:"));

    let logs = output.path().join("logs");
    let dictionary_log = fs::read_to_string(logs.join("data_dictionary.txt")).unwrap();
    assert!(dictionary_log.contains("PI_Lab\tData Owner\towner\tRequired"));
    let sample_log = fs::read_to_string(logs.join("sample_information.txt")).unwrap();
    assert!(sample_log.contains("S1\tOrganism\tHomo sapiens"));
    assert!(logs.join("project_information.txt").exists());
}

#[test]
fn test_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let result = Linter::new()
        .lint(&workbook(), &AuditLog::disabled(), false)
        .unwrap();
    result.write_outputs(dir.path()).unwrap();

    let written = fs::read_to_string(dir.path().join(SAMPLE_FILE)).unwrap();
    assert!(written.starts_with("{\n    \""));
    assert!(written.ends_with("}\n"));

    let samples: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(samples, serde_json::to_value(&result.tree.samples).unwrap());

    let tree: MetadataTree = serde_json::from_value(serde_json::json!({
        "pi": read_json(&dir.path().join(PROJECT_FILE))["PI_Lab"],
        "project": read_json(&dir.path().join(PROJECT_FILE))["Project"],
        "samples": samples,
    }))
    .unwrap();
    assert_eq!(tree, result.tree);
}

#[test]
fn test_metadata_tree_feeds_remote_diff() {
    let dir = tempfile::tempdir().unwrap();
    let linter = Linter::new();
    let result = linter.lint(&workbook(), &AuditLog::disabled(), false).unwrap();
    let written = result
        .write_metadata(dir.path(), &linter.config().entity_names)
        .unwrap();
    assert_eq!(written.len(), 4);

    let project: MetadataEntries =
        serde_json::from_value(read_json(&dir.path().join("Jane_Doe/Liver_RNA-seq.metadata.json")))
            .unwrap();
    assert_eq!(project.value("project_title"), Some("Liver RNA-seq"));
    assert_eq!(project.value("access"), Some("Closed Access"));
    assert_eq!(project.value("number_of_samples"), Some("2"));

    let s1: MetadataEntries = serde_json::from_value(read_json(
        &dir.path().join("Jane_Doe/Liver_RNA-seq/S1.metadata.json"),
    ))
    .unwrap();
    let remote = vec![
        Attribute::new("batch", "B1"),
        Attribute::new("organism", "Mus musculus"),
        Attribute::new("sample_id", "S1"),
    ];
    let diff = diff_attributes(&remote, &s1.metadata_entries);
    assert_eq!(diff.remote_only, vec!["batch"]);
    assert_eq!(diff.local_only, vec![Attribute::new("sample_type", "tumor")]);
    assert_eq!(diff.shared, vec!["organism", "sample_id"]);
    assert_eq!(diff.changed.len(), 1);
    assert_eq!(diff.changed[0].local, "Homo sapiens");

    assert!(diff_attributes(&s1.metadata_entries, &s1.metadata_entries).is_unchanged());

    let steps = plan_registration(dir.path(), "CCBR_Archive", "/data", true).unwrap();
    assert_eq!(steps.len(), 4);
    assert_eq!(steps[3].target(), "/CCBR_Archive/Jane_Doe/Liver_RNA-seq/S2");
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn test_upward_aggregation_without_sample_values() {
    let mut config = LintConfig::default();
    config.propagation.upward.push("Library Strategy".to_string());

    let result = Linter::with_config(config)
        .unwrap()
        .lint(&workbook(), &AuditLog::disabled(), false)
        .unwrap();

    assert_eq!(
        result.tree.project.get("Library Strategy"),
        Some(&FieldValue::List(vec![String::new()]))
    );
    assert!(result
        .report
        .of_type(ObservationType::UnknownField)
        .any(|o| o.field == "Library Strategy"));
}

// =============================================================================
// Fatal errors
// =============================================================================

#[test]
fn test_minimum_required_missing_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    write_tsv(input.path(), "Data Dictionary", DICTIONARY);
    write_tsv(input.path(), "Project Template", PROJECT);
    write_tsv(
        input.path(),
        "Sample Template",
        &[&["Samples"], &["Instructions"], &["Sample ID", "Sample Type"], &["S1", "tumor"]],
    );
    let output = tempfile::tempdir().unwrap();

    let mut config = LintConfig::default();
    config.minimum_required.push("Organism".to_string());

    let err = Linter::with_config(config)
        .unwrap()
        .lint_file(input.path(), Some(output.path()), false)
        .unwrap_err();

    match err {
        SheetlintError::RequiredFieldsMissing { fields } => assert_eq!(fields, vec!["Organism"]),
        other => panic!("unexpected error: {}", other),
    }
    for file in [DICTIONARY_FILE, PROJECT_FILE, SAMPLE_FILE, VALIDATION_FILE] {
        assert!(!output.path().join(file).exists());
    }
}

#[test]
fn test_required_field_blank_is_fatal() {
    let samples: &[&[&str]] = &[
        &["Samples"],
        &["Instructions"],
        &["Sample ID", "Organism"],
        &["S1", "Homo sapiens"],
        &["S2", ""],
    ];
    let err = Linter::new()
        .lint(&workbook_with(samples), &AuditLog::disabled(), false)
        .unwrap_err();
    assert!(matches!(
        err,
        SheetlintError::RequiredFieldBlank { ref field, .. } if field == "Organism"
    ));
}

#[test]
fn test_unknown_sample_reference_names_every_id() {
    let mut config = LintConfig::default();
    config.additional_sheets.push(AdditionalSheet {
        window: SheetWindow::new("Sequencing"),
        target: CollectionType::Sample,
        key_label: None,
        policy: MergePolicy::Update,
    });
    let workbook = workbook().with_sheet(
        "Sequencing",
        &[
            &["Sample ID", "Library Strategy"],
            &["S1", "RNA-Seq"],
            &["S7", "RNA-Seq"],
            &["S9", "WGS"],
        ],
    );

    let err = Linter::with_config(config)
        .unwrap()
        .lint(&workbook, &AuditLog::disabled(), false)
        .unwrap_err();
    match err {
        SheetlintError::UnknownSampleReference { sample_ids } => {
            assert_eq!(sample_ids, vec!["S7", "S9"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_preserve_sheet_keeps_existing_values() {
    let mut config = LintConfig::default();
    config.additional_sheets.push(AdditionalSheet {
        window: SheetWindow::new("Sequencing"),
        target: CollectionType::Sample,
        key_label: None,
        policy: MergePolicy::Preserve,
    });
    let workbook = workbook().with_sheet(
        "Sequencing",
        &[
            &["Sample ID", "Organism", "Library Strategy"],
            &["S1", "Mus musculus", "RNA-Seq"],
        ],
    );

    let result = Linter::with_config(config)
        .unwrap()
        .lint(&workbook, &AuditLog::disabled(), false)
        .unwrap();

    let s1 = &result.tree.samples["S1"];
    assert_eq!(s1.get("Organism"), Some(&FieldValue::from("Homo sapiens")));
    assert_eq!(s1.get("Library Strategy"), Some(&FieldValue::from("RNA-Seq")));
    assert_eq!(result.tree.samples["S2"].get("Library Strategy"), None);

    let unknown: Vec<_> = result.report.of_type(ObservationType::UnknownField).collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].field, "Library Strategy");
    assert_eq!(unknown[0].severity, Severity::Info);
}

#[test]
fn test_boundary_layout_without_markers() {
    let mut config = LintConfig::default();
    config.project.layout = SectionLayout::Boundary {
        row: 2,
        before: CollectionType::PiLab,
        after: CollectionType::Project,
    };
    let project: &[&[&str]] = &[
        &["Project Information"],
        &["Optional fields may be left blank"],
        &["Data Owner", "Jane Doe"],
        &["Affiliation", "NCI"],
        &["Project Title", "Liver RNA-seq"],
        &["Access", "Open Access"],
    ];
    let workbook = MemoryWorkbook::new()
        .with_sheet("Data Dictionary", DICTIONARY)
        .with_sheet("Project Template", project)
        .with_sheet("Sample Template", SAMPLES);

    let result = Linter::with_config(config)
        .unwrap()
        .lint(&workbook, &AuditLog::disabled(), false)
        .unwrap();

    assert_eq!(
        result.tree.pi.get("Affiliation"),
        Some(&FieldValue::List(vec!["NCI".to_string()]))
    );
    assert_eq!(result.tree.pi.get("Project Title"), None);
    assert_eq!(
        result.tree.project.get("Access"),
        Some(&FieldValue::List(vec!["Open Access".to_string()]))
    );
    assert!(result.report.missing.is_empty());
    assert_eq!(result.report.of_type(ObservationType::UnknownField).count(), 0);
}

#[test]
fn test_short_multi_valued_field_warns() {
    let mut dictionary: Vec<&[&str]> = DICTIONARY.to_vec();
    dictionary.insert(6, &["Required", "Organism(s)", "organism", "", ""]);
    let project: &[&[&str]] = &[
        &["Project Information"],
        &["Optional fields may be left blank"],
        &["PI_Lab Collection", "PI_Lab"],
        &["Data Owner", "Jane Doe"],
        &["Project Collection", "Project"],
        &["Project Title", "Liver atlas"],
        &["Type of Project", "RNA-seq", "ATAC-seq", "ChIP-seq"],
        &["Origin of Data", "In-house", "In-house", "Collaborator"],
        &["Study Disease", "HCC", "HCC", "Cirrhosis"],
        &["Organism(s)", "Homo sapiens"],
    ];
    let workbook = MemoryWorkbook::new()
        .with_sheet("Data Dictionary", &dictionary)
        .with_sheet("Project Template", project)
        .with_sheet("Sample Template", SAMPLES);

    let result = Linter::new()
        .lint(&workbook, &AuditLog::disabled(), false)
        .unwrap();

    assert_eq!(result.subproject_estimate, 3);
    assert!(result.report.missing.is_empty());
    let incomplete: Vec<_> = result
        .report
        .of_type(ObservationType::IncompleteSubprojects)
        .collect();
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0].field, "Organism(s)");
    assert_eq!(incomplete[0].collection, Some(CollectionType::Project));
    assert_eq!(incomplete[0].severity, Severity::Warning);
}

#[test]
fn test_unknown_sample_reference_leaves_tree_untouched() {
    let mut tree = MetadataTree::new();
    let s1: EntityRecord = [("Organism".to_string(), FieldValue::from("Homo sapiens"))]
        .into_iter()
        .collect();
    tree.samples.insert("S1".to_string(), s1);
    let before = tree.clone();

    let mut additions = std::collections::BTreeMap::new();
    additions.insert(
        "S1".to_string(),
        [("Organism".to_string(), FieldValue::from("Mus musculus"))]
            .into_iter()
            .collect::<EntityRecord>(),
    );
    additions.insert("S5".to_string(), EntityRecord::new());

    assert!(tree.merge_samples(additions, MergePolicy::Update).is_err());
    assert_eq!(tree, before);
}

#[test]
fn test_missing_sheets_from_directory() {
    let input = tempfile::tempdir().unwrap();
    write_tsv(input.path(), "Data Dictionary", DICTIONARY);

    let err = Linter::new()
        .lint_file(input.path(), None, false)
        .unwrap_err();
    match err {
        SheetlintError::MissingSheets { sheets } => {
            assert_eq!(sheets, vec!["Project Template", "Sample Template"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_workbook() {
    let err = Linter::new()
        .lint_file("does/not/exist.xlsx", None, false)
        .unwrap_err();
    assert!(matches!(err, SheetlintError::FileNotFound { .. }));
}
