//! Per-stage audit logs: every parsed tuple, tab separated.
//!
//! Logs live under `<output>/logs/`, one file per extraction stage. Each
//! [`StageLog`] owns its file handle and releases it when dropped, so an
//! extraction that fails half way still closes its log before the next stage
//! starts.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::error::{Result, SheetlintError};

/// Extraction stages that keep an audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStage {
    Dictionary,
    Project,
    Sample,
}

impl AuditStage {
    /// Log file name for the stage.
    pub fn file_name(&self) -> &'static str {
        match self {
            AuditStage::Dictionary => "data_dictionary.txt",
            AuditStage::Project => "project_information.txt",
            AuditStage::Sample => "sample_information.txt",
        }
    }
}

/// Factory for stage logs. Disabled logs accept records and drop them.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    dir: Option<PathBuf>,
}

impl AuditLog {
    /// Log into `<output_dir>/logs`, creating the directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = output_dir.as_ref().join("logs");
        fs::create_dir_all(&dir).map_err(|e| SheetlintError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir: Some(dir) })
    }

    /// A log that writes nothing.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Directory holding the log files, if enabled.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Open (truncate) the log of one stage.
    pub fn stage(&self, stage: AuditStage) -> Result<StageLog> {
        let Some(dir) = &self.dir else {
            return Ok(StageLog { writer: None });
        };
        let path = dir.join(stage.file_name());
        let file = File::create(&path).map_err(|e| SheetlintError::Io {
            path: path.clone(),
            source: e,
        })?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .flexible(true)
            .from_writer(file);
        Ok(StageLog {
            writer: Some((writer, path)),
        })
    }
}

/// An open stage log.
pub struct StageLog {
    writer: Option<(Writer<File>, PathBuf)>,
}

impl StageLog {
    /// Append one tuple as a tab-separated line.
    pub fn record<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        if let Some((writer, _)) = &mut self.writer {
            writer.write_record(fields)?;
        }
        Ok(())
    }

    /// Flush and close the log.
    pub fn finish(mut self) -> Result<()> {
        if let Some((mut writer, path)) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| SheetlintError::Io { path, source: e })?;
        }
        Ok(())
    }
}
