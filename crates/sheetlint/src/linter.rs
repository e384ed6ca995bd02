//! Main Linter struct and public API.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{assemble_block, assemble_dictionary, assemble_project, assemble_samples};
use crate::audit::{AuditLog, AuditStage};
use crate::config::{EntityNames, LintConfig, MarkerSet, SheetWindow};
use crate::error::{Result, SheetlintError};
use crate::input::{load_workbook, read_window, SourceMetadata, TableWindow, Workbook};
use crate::model::{CollectionType, Dictionary, EntityRecord, MetadataTree};
use crate::output::write_json;
use crate::propagate::propagate;
use crate::register::write_metadata_tree;
use crate::validation::{ValidationEngine, ValidationReport};

/// Output file names, relative to the output directory.
pub const DICTIONARY_FILE: &str = "data_dictionary.json";
pub const PROJECT_FILE: &str = "project.json";
pub const SAMPLE_FILE: &str = "sample.json";
pub const VALIDATION_FILE: &str = "validation.json";
/// Directory of per-entity registration files.
pub const METADATA_DIR: &str = "meta";

/// Result of linting a workbook.
#[derive(Debug, Clone)]
pub struct LintResult {
    /// Metadata about the input, when read from disk.
    pub source: Option<SourceMetadata>,
    pub dictionary: Dictionary,
    pub tree: MetadataTree,
    pub report: ValidationReport,
    /// Informational estimate of the number of sub-projects.
    pub subproject_estimate: usize,
}

/// Counts shown after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintSummary {
    pub dictionary_fields: usize,
    pub pi_fields: usize,
    pub project_fields: usize,
    pub samples: usize,
    pub subproject_estimate: usize,
    pub missing: usize,
    pub warnings: usize,
}

impl LintResult {
    /// Summary counts.
    pub fn summary(&self) -> LintSummary {
        LintSummary {
            dictionary_fields: self.dictionary.len(),
            pi_fields: self.tree.pi.len(),
            project_fields: self.tree.project.len(),
            samples: self.tree.sample_count(),
            subproject_estimate: self.subproject_estimate,
            missing: self.report.missing.len(),
            warnings: self.report.observations.len(),
        }
    }

    /// Write `data_dictionary.json`, `project.json`, `sample.json` and
    /// `validation.json` into `dir`. Returns the written paths.
    pub fn write_outputs(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let files = [DICTIONARY_FILE, PROJECT_FILE, SAMPLE_FILE, VALIDATION_FILE];
        let paths: Vec<PathBuf> = files.iter().map(|f| dir.join(f)).collect();

        write_json(&paths[0], &self.dictionary)?;
        write_json(&paths[1], &self.tree.project_document())?;
        write_json(&paths[2], &self.tree.samples)?;
        write_json(&paths[3], &self.report)?;

        Ok(paths)
    }

    /// Write the registration files for every PI, Project and Sample under
    /// `dir`. See [`write_metadata_tree`].
    pub fn write_metadata(&self, dir: impl AsRef<Path>, names: &EntityNames) -> Result<Vec<PathBuf>> {
        write_metadata_tree(dir, &self.tree, &self.dictionary, names)
    }
}

/// The workbook linter.
pub struct Linter {
    config: LintConfig,
    markers: MarkerSet,
}

impl Linter {
    /// Create a linter with the default configuration.
    pub fn new() -> Self {
        Self {
            config: LintConfig::default(),
            markers: MarkerSet::default(),
        }
    }

    /// Create a linter with a custom configuration.
    pub fn with_config(config: LintConfig) -> Result<Self> {
        config.check()?;
        let markers = config.markers.compile()?;
        Ok(Self { config, markers })
    }

    /// Configuration in use.
    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Load a workbook from disk and lint it.
    ///
    /// With an `output_dir`, audit logs are written to `<output_dir>/logs`.
    /// JSON outputs are not written here; see [`LintResult::write_outputs`].
    pub fn lint_file(
        &self,
        path: impl AsRef<Path>,
        output_dir: Option<&Path>,
        dry_run: bool,
    ) -> Result<LintResult> {
        let (workbook, source) = load_workbook(path)?;
        let audit = match output_dir {
            Some(dir) => AuditLog::new(dir)?,
            None => AuditLog::disabled(),
        };
        let mut result = self.lint(&workbook, &audit, dry_run)?;
        result.source = Some(source);
        Ok(result)
    }

    /// Lint an in-memory workbook.
    ///
    /// Stages run in order and the first fatal error stops the run:
    /// required sheets, dictionary, project block, sample table, additional
    /// sheets, propagation and validation.
    pub fn lint(&self, workbook: &dyn Workbook, audit: &AuditLog, dry_run: bool) -> Result<LintResult> {
        self.check_sheets(workbook)?;

        let window = self.window(workbook, &self.config.dictionary.window, dry_run)?;
        let mut log = audit.stage(AuditStage::Dictionary)?;
        let dictionary = assemble_dictionary(&window, &self.config.dictionary, &self.markers, &mut log)?;
        log.finish()?;

        let window = self.window(workbook, &self.config.project.window, dry_run)?;
        let mut log = audit.stage(AuditStage::Project)?;
        let project = assemble_project(&window, &self.config.project.layout, &self.markers, &mut log)?;
        log.finish()?;
        let subproject_estimate = project.subproject_estimate();

        let window = self.window(workbook, &self.config.sample.window, dry_run)?;
        let mut log = audit.stage(AuditStage::Sample)?;
        let samples = assemble_samples(&window, &self.config.sample.key_label, &self.markers, &mut log)?;
        log.finish()?;

        let mut tree = MetadataTree {
            pi: project.pi,
            project: project.project,
            samples,
        };
        info!(
            samples = tree.sample_count(),
            subprojects = subproject_estimate,
            "extracted workbook metadata"
        );

        self.merge_additional(workbook, &mut tree, dry_run)?;

        let skipped = propagate(&mut tree, &self.config.propagation);

        let mut report = ValidationEngine::new(&dictionary, &self.config)
            .with_subproject_estimate(subproject_estimate)
            .validate(&tree)?;
        for observation in skipped {
            report.observe(observation);
        }

        Ok(LintResult {
            source: None,
            dictionary,
            tree,
            report,
            subproject_estimate,
        })
    }

    /// Fail unless every required sheet exists, naming all missing ones.
    fn check_sheets(&self, workbook: &dyn Workbook) -> Result<()> {
        let missing: Vec<String> = self
            .config
            .required_sheets
            .iter()
            .filter(|sheet| !workbook.has_sheet(sheet))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SheetlintError::MissingSheets { sheets: missing })
        }
    }

    fn window(&self, workbook: &dyn Workbook, window: &SheetWindow, dry_run: bool) -> Result<TableWindow> {
        if dry_run {
            read_window(workbook, &window.for_dry_run())
        } else {
            read_window(workbook, window)
        }
    }

    fn merge_additional(&self, workbook: &dyn Workbook, tree: &mut MetadataTree, dry_run: bool) -> Result<()> {
        let disabled = AuditLog::disabled();
        for extra in &self.config.additional_sheets {
            let window = self.window(workbook, &extra.window, dry_run)?;
            debug!(sheet = %window.sheet, collection = %extra.target, "merging additional sheet");
            match extra.target {
                CollectionType::Sample => {
                    let key_label = extra
                        .key_label
                        .as_deref()
                        .unwrap_or(self.config.sample.key_label.as_str());
                    let mut log = disabled.stage(AuditStage::Sample)?;
                    let additions: BTreeMap<String, EntityRecord> =
                        assemble_samples(&window, key_label, &self.markers, &mut log)?;
                    tree.merge_samples(additions, extra.policy)?;
                }
                collection => {
                    let additions = assemble_block(&window, collection, &self.markers)?;
                    tree.merge_collection(collection, additions, extra.policy)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}
