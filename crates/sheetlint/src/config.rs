//! Declarative configuration for sheet layouts, requirements and propagation.
//!
//! Every layout constant the extractors need (sheet names, skipped rows,
//! column indices, special markers) lives here so the extractors stay free of
//! workbook-specific knowledge. A [`LintConfig`] is built once and passed by
//! reference into each component.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetlintError};
use crate::model::{CollectionType, MergePolicy};

/// Rectangular window into one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetWindow {
    /// Sheet to read.
    pub sheet: String,
    /// Sheet to read instead on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_sheet: Option<String>,
    /// Leading rows to skip.
    pub skip_rows: usize,
    /// Exact sheet row indices (0-based) to drop, applied before `skip_rows`.
    pub drop_rows: Vec<usize>,
    /// Maximum rows to keep after skipping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
    /// Column subset, in output order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<usize>>,
}

impl Default for SheetWindow {
    fn default() -> Self {
        Self {
            sheet: String::new(),
            example_sheet: None,
            skip_rows: 0,
            drop_rows: Vec::new(),
            max_rows: None,
            columns: None,
        }
    }
}

impl SheetWindow {
    /// Window over a whole sheet.
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            ..Self::default()
        }
    }

    /// Set the example sheet used for dry runs.
    pub fn with_example_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.example_sheet = Some(sheet.into());
        self
    }

    /// Drop exact row indices.
    pub fn with_drop_rows(mut self, rows: Vec<usize>) -> Self {
        self.drop_rows = rows;
        self
    }

    /// Skip leading rows.
    pub fn with_skip_rows(mut self, rows: usize) -> Self {
        self.skip_rows = rows;
        self
    }

    /// Limit the number of rows.
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }

    /// Restrict to a column subset.
    pub fn with_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// The same window pointed at the example sheet, when one is configured.
    pub fn for_dry_run(&self) -> SheetWindow {
        let mut window = self.clone();
        if let Some(example) = &self.example_sheet {
            window.sheet = example.clone();
        }
        window
    }
}

/// Column positions of the Data Dictionary sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryLayout {
    pub window: SheetWindow,
    pub collection_column: usize,
    pub required_column: usize,
    pub field_column: usize,
    pub external_column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_column: Option<usize>,
}

impl Default for DictionaryLayout {
    fn default() -> Self {
        Self {
            window: SheetWindow::new("Data Dictionary").with_drop_rows(vec![0]),
            collection_column: 0,
            required_column: 0,
            field_column: 1,
            external_column: 2,
            description_column: Some(3),
            example_column: Some(4),
        }
    }
}

/// How rows of a key/value block are assigned to collection types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SectionLayout {
    /// Marker rows ("PI_Lab Collection", ...) switch the current type.
    Markers,
    /// Rows before `row` belong to `before`, the rest to `after`.
    Boundary {
        row: usize,
        before: CollectionType,
        after: CollectionType,
    },
    /// Every row belongs to one type.
    Fixed { collection: CollectionType },
}

/// Layout of the Project Template sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    pub window: SheetWindow,
    pub layout: SectionLayout,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            window: SheetWindow::new("Project Template")
                .with_example_sheet("Example Project")
                .with_drop_rows(vec![0, 1]),
            layout: SectionLayout::Markers,
        }
    }
}

/// Layout of the Sample Template sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleLayout {
    pub window: SheetWindow,
    /// Header cell that names the identifier column.
    pub key_label: String,
}

impl Default for SampleLayout {
    fn default() -> Self {
        Self {
            window: SheetWindow::new("Sample Template")
                .with_example_sheet("Example Sample")
                .with_drop_rows(vec![0, 1]),
            key_label: "Sample ID".to_string(),
        }
    }
}

/// A supplementary sheet merged into the tree after primary extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalSheet {
    pub window: SheetWindow,
    /// Collection the sheet enriches.
    pub target: CollectionType,
    /// Identifier header label, for sample sheets (defaults to the Sample
    /// section's label).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_label: Option<String>,
    #[serde(default)]
    pub policy: MergePolicy,
}

/// Copy `project[project_field][0]` into every sample's `sample_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCopy {
    pub project_field: String,
    pub sample_field: String,
}

/// A literal value injected when the user left the field unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefault {
    pub level: CollectionType,
    pub field: String,
    pub value: String,
}

/// A generated sentence summarizing sample counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRule {
    /// Project field receiving the sentence.
    pub field: String,
    /// Sample fields enumerated in the sentence.
    pub fields: Vec<String>,
}

/// Cross-level propagation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationRules {
    pub downward: Vec<FieldCopy>,
    pub upward: Vec<String>,
    pub defaults: Vec<FieldDefault>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_count_field: Option<String>,
}

impl Default for PropagationRules {
    fn default() -> Self {
        Self {
            downward: Vec::new(),
            upward: Vec::new(),
            defaults: vec![FieldDefault {
                level: CollectionType::Project,
                field: "Access".to_string(),
                value: "Closed Access".to_string(),
            }],
            summary: Some(SummaryRule {
                field: "Summary of Samples".to_string(),
                fields: vec!["Organism".to_string(), "Sample Type".to_string()],
            }),
            sample_count_field: Some("Number of Samples".to_string()),
        }
    }
}

/// Text markers recognized in human-edited sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Token identifying a collection-type header row.
    pub section: String,
    /// Prefix of instructional rows that carry no data.
    pub instruction: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            section: "collection".to_string(),
            instruction: "optional field".to_string(),
        }
    }
}

impl Markers {
    /// Compile into case-insensitive matchers.
    pub fn compile(&self) -> Result<MarkerSet> {
        if self.section.trim().is_empty() {
            return Err(SheetlintError::Config(
                "section marker must not be empty".to_string(),
            ));
        }
        Ok(MarkerSet {
            section: Regex::new(&format!("(?i){}", regex::escape(self.section.trim())))?,
            instruction: Regex::new(&format!(
                r"(?i)^\s*{}",
                regex::escape(self.instruction.trim())
            ))?,
        })
    }
}

/// Compiled [`Markers`].
#[derive(Debug, Clone)]
pub struct MarkerSet {
    section: Regex,
    instruction: Regex,
}

impl MarkerSet {
    /// True if the cell text marks a collection-type header.
    pub fn is_section(&self, text: &str) -> bool {
        self.section.is_match(text)
    }

    /// True if the cell text starts an instructional row.
    pub fn is_instruction(&self, text: &str) -> bool {
        self.instruction.is_match(text)
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Markers::default()
            .compile()
            .expect("default markers are valid patterns")
    }
}

/// Fields whose first value names the PI and Project collections of a
/// prepared metadata directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityNames {
    pub pi_field: String,
    pub project_field: String,
}

impl Default for EntityNames {
    fn default() -> Self {
        Self {
            pi_field: "Data Owner".to_string(),
            project_field: "Project Title".to_string(),
        }
    }
}

/// Complete configuration for one lint run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Sheets that must exist before any parsing begins.
    pub required_sheets: Vec<String>,
    pub dictionary: DictionaryLayout,
    pub project: ProjectLayout,
    pub sample: SampleLayout,
    /// Project fields expected to hold exactly one value.
    pub singular_fields: Vec<String>,
    /// Project fields legitimately holding one value per sub-project.
    pub mvd_fields: Vec<String>,
    /// Fields that must be provided at either level; deficiency is fatal.
    pub minimum_required: Vec<String>,
    pub additional_sheets: Vec<AdditionalSheet>,
    pub propagation: PropagationRules,
    pub markers: Markers,
    pub entity_names: EntityNames,
    /// Vaults accepted as registration targets.
    pub vaults: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            required_sheets: to_strings(&["Data Dictionary", "Project Template", "Sample Template"]),
            dictionary: DictionaryLayout::default(),
            project: ProjectLayout::default(),
            sample: SampleLayout::default(),
            singular_fields: to_strings(&[
                "PI Name",
                "PI Affiliation",
                "Project Title",
                "Project Description",
                "Start Date",
                "Project POC",
                "Contact Email",
            ]),
            mvd_fields: to_strings(&[
                "Nature of Request",
                "Type of Project",
                "Origin of Data",
                "Access",
                "Organism(s)",
                "Number of Samples",
                "Summary of Samples",
                "Project Supplementary file",
                "Collaborators",
                "Publication Status",
                "PubMed ID",
                "DOI",
                "Public Data Accession ID",
                "Other Affiliation",
                "Other Related CCBR Project",
                "Project Priority Comment",
                "Study Disease",
                "Assembly Name",
                "Platform Name",
                "Cell Line Name",
            ]),
            minimum_required: Vec::new(),
            additional_sheets: Vec::new(),
            propagation: PropagationRules::default(),
            markers: Markers::default(),
            entity_names: EntityNames::default(),
            vaults: to_strings(&["CCBR_Archive", "CCBR_EXT_Archive", "CCR_DTB_Archive"]),
        }
    }
}

impl LintConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SheetlintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: LintConfig = serde_json::from_reader(BufReader::new(file))?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations the extractors cannot work with.
    pub fn check(&self) -> Result<()> {
        if self.sample.key_label.trim().is_empty() {
            return Err(SheetlintError::Config(
                "sample.key_label must not be empty".to_string(),
            ));
        }
        for extra in &self.additional_sheets {
            if extra.window.sheet.trim().is_empty() {
                return Err(SheetlintError::Config(
                    "additional sheet without a sheet name".to_string(),
                ));
            }
        }
        self.markers.compile()?;
        Ok(())
    }

    /// Reject vaults that are not registration targets.
    pub fn check_vault(&self, vault: &str) -> Result<()> {
        if self.vaults.iter().any(|v| v == vault) {
            Ok(())
        } else {
            Err(SheetlintError::Config(format!(
                "'{}' is not a valid vault (expected one of {})",
                vault,
                self.vaults.join(", ")
            )))
        }
    }

    /// True if the field may hold one value per sub-project.
    pub fn is_mvd(&self, field: &str) -> bool {
        self.mvd_fields.iter().any(|f| f == field)
    }

    /// True if the field must hold at most one value.
    pub fn is_singular(&self, field: &str) -> bool {
        self.singular_fields.iter().any(|f| f == field)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
