//! Registration of prepared metadata with the remote store.
//!
//! A prepared metadata directory looks like:
//!
//! ```text
//! meta/
//! ├── <PI>.metadata.json
//! └── <PI>/
//!     ├── <Project>.metadata.json
//!     └── <Project>/
//!         ├── <Sample>.metadata.json
//!         └── ...
//! ```
//!
//! [`write_metadata_tree`] prepares such a directory from a linted tree.
//! Registration runs the DME command line tools once per entity. Any failure
//! stops the run.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::EntityNames;
use crate::error::{Result, SheetlintError};
use crate::input::is_absent;
use crate::model::{CollectionType, Dictionary, EntityRecord, MetadataTree};
use crate::output::write_json;
use crate::remote::MetadataEntries;

const METADATA_SUFFIX: &str = ".metadata.json";

/// Attribute naming the sample's sequencing files.
pub const RAW_FILE_ATTRIBUTE: &str = "raw_file_1";

/// Registers collections and data objects.
pub trait Registrar {
    /// Register a collection at `target` with the attributes in `metadata_file`.
    fn register_collection(&self, metadata_file: &Path, target: &str) -> Result<()>;

    /// Register `data_file` as a data object at `target`.
    fn register_data_object(&self, metadata_file: &Path, target: &str, data_file: &Path) -> Result<()>;
}

/// Registrar backed by the `dm_register_*` command line tools.
#[derive(Debug, Clone)]
pub struct CommandRegistrar {
    collection_command: String,
    data_object_command: String,
}

impl Default for CommandRegistrar {
    fn default() -> Self {
        Self {
            collection_command: "dm_register_collection".to_string(),
            data_object_command: "dm_register_dataobject".to_string(),
        }
    }
}

impl CommandRegistrar {
    /// Create a registrar using the standard tool names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use other executables (for wrappers and tests).
    pub fn with_commands(collection: impl Into<String>, data_object: impl Into<String>) -> Self {
        Self {
            collection_command: collection.into(),
            data_object_command: data_object.into(),
        }
    }

    fn run(&self, program: &str, args: &[&OsStr]) -> Result<()> {
        debug!(program, ?args, "running registration command");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| SheetlintError::ExternalCommand {
                command: program.to_string(),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(SheetlintError::ExternalCommand {
                command: program.to_string(),
                message: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

impl Registrar for CommandRegistrar {
    fn register_collection(&self, metadata_file: &Path, target: &str) -> Result<()> {
        self.run(
            &self.collection_command,
            &[metadata_file.as_os_str(), OsStr::new(target)],
        )
    }

    fn register_data_object(&self, metadata_file: &Path, target: &str, data_file: &Path) -> Result<()> {
        self.run(
            &self.data_object_command,
            &[metadata_file.as_os_str(), OsStr::new(target), data_file.as_os_str()],
        )
    }
}

/// One registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStep {
    Collection {
        metadata_file: PathBuf,
        target: String,
    },
    DataObject {
        metadata_file: PathBuf,
        target: String,
        data_file: PathBuf,
    },
}

impl RegistrationStep {
    /// Remote path being registered.
    pub fn target(&self) -> &str {
        match self {
            RegistrationStep::Collection { target, .. }
            | RegistrationStep::DataObject { target, .. } => target,
        }
    }
}

/// Write one registration metadata file per PI, Project and Sample under
/// `dir`, laid out the way [`plan_registration`] reads it back.
///
/// PI and Project directories are named after the first value of the
/// configured fields, samples after their id. Names are reduced to
/// alphanumerics, `-`, `_` and `.`. Returns the written paths, PI first.
pub fn write_metadata_tree(
    dir: impl AsRef<Path>,
    tree: &MetadataTree,
    dictionary: &Dictionary,
    names: &EntityNames,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let pi = entity_name(&tree.pi, &names.pi_field, "PI_Lab");
    let project = entity_name(&tree.project, &names.project_field, "Project");

    let mut written = Vec::with_capacity(tree.sample_count() + 2);
    written.push(write_entries(
        metadata_path(dir, &pi),
        &tree.pi,
        CollectionType::PiLab,
        dictionary,
    )?);

    let pi_dir = dir.join(&pi);
    written.push(write_entries(
        metadata_path(&pi_dir, &project),
        &tree.project,
        CollectionType::Project,
        dictionary,
    )?);

    let project_dir = pi_dir.join(&project);
    for (sample_id, record) in &tree.samples {
        let path = metadata_path(&project_dir, &sanitize(sample_id));
        written.push(write_entries(path, record, CollectionType::Sample, dictionary)?);
    }

    info!(dir = %dir.display(), files = written.len(), "wrote metadata tree");
    Ok(written)
}

fn write_entries(
    path: PathBuf,
    record: &EntityRecord,
    collection: CollectionType,
    dictionary: &Dictionary,
) -> Result<PathBuf> {
    let entries = MetadataEntries {
        metadata_entries: record.to_attributes(collection, dictionary),
    };
    write_json(&path, &entries)?;
    Ok(path)
}

fn entity_name(record: &EntityRecord, field: &str, fallback: &str) -> String {
    let name = record
        .get(field)
        .and_then(|value| value.values().iter().find(|v| !is_absent(v)).map(|v| sanitize(v)))
        .filter(|name| !name.is_empty() && !name.chars().all(|c| c == '.'));
    name.unwrap_or_else(|| {
        warn!(field, fallback, "no value to name the collection after");
        fallback.to_string()
    })
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Plan the registration of a prepared metadata directory.
///
/// PI, Project and every Sample are registered as collections. Unless
/// `update` is set, each sample's paired FASTQ files (`<raw_file_1>.R1.fastq.gz`
/// and `.R2.fastq.gz` in `data_dir`) follow their sample.
pub fn plan_registration(
    meta_dir: impl AsRef<Path>,
    vault: &str,
    data_dir: impl AsRef<Path>,
    update: bool,
) -> Result<Vec<RegistrationStep>> {
    let meta_dir = meta_dir.as_ref();
    let data_dir = data_dir.as_ref();
    let mut steps = Vec::new();

    let pi = first_entity(meta_dir)?;
    let pi_target = format!("/{}/{}", vault, pi);
    steps.push(RegistrationStep::Collection {
        metadata_file: metadata_path(meta_dir, &pi),
        target: pi_target.clone(),
    });

    let pi_dir = meta_dir.join(&pi);
    let project = first_entity(&pi_dir)?;
    let project_target = format!("{}/{}", pi_target, project);
    steps.push(RegistrationStep::Collection {
        metadata_file: metadata_path(&pi_dir, &project),
        target: project_target.clone(),
    });

    let project_dir = pi_dir.join(&project);
    for sample in entities(&project_dir)? {
        let metadata_file = metadata_path(&project_dir, &sample);
        let sample_target = format!("{}/{}", project_target, sample);
        steps.push(RegistrationStep::Collection {
            metadata_file: metadata_file.clone(),
            target: sample_target.clone(),
        });

        if update {
            continue;
        }

        let entries = read_entries(&metadata_file)?;
        let data_name = entries.value(RAW_FILE_ATTRIBUTE).ok_or_else(|| {
            SheetlintError::Config(format!(
                "'{}' has no {} attribute",
                metadata_file.display(),
                RAW_FILE_ATTRIBUTE
            ))
        })?;
        for read in ["R1", "R2"] {
            let file_name = format!("{}.{}.fastq.gz", data_name, read);
            steps.push(RegistrationStep::DataObject {
                metadata_file: metadata_file.clone(),
                target: format!("{}/{}", sample_target, file_name),
                data_file: data_dir.join(&file_name),
            });
        }
    }

    Ok(steps)
}

/// Run planned steps in order, stopping at the first failure.
pub fn execute(steps: &[RegistrationStep], registrar: &dyn Registrar) -> Result<()> {
    for step in steps {
        info!(path = step.target(), "registering");
        match step {
            RegistrationStep::Collection {
                metadata_file,
                target,
            } => registrar.register_collection(metadata_file, target)?,
            RegistrationStep::DataObject {
                metadata_file,
                target,
                data_file,
            } => registrar.register_data_object(metadata_file, target, data_file)?,
        }
    }
    Ok(())
}

fn metadata_path(dir: &Path, entity: &str) -> PathBuf {
    dir.join(format!("{}{}", entity, METADATA_SUFFIX))
}

/// Entity names with a metadata file in `dir`, sorted.
fn entities(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(|e| SheetlintError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.strip_suffix(METADATA_SUFFIX).map(str::to_string)
        })
        .collect();
    names.sort();
    Ok(names)
}

fn first_entity(dir: &Path) -> Result<String> {
    entities(dir)?.into_iter().next().ok_or_else(|| {
        SheetlintError::FileNotFound {
            path: dir.join(format!("*{}", METADATA_SUFFIX)),
        }
    })
}

fn read_entries(path: &Path) -> Result<MetadataEntries> {
    let file = File::open(path).map_err(|e| SheetlintError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
