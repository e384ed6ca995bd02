//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sheetlint: metadata extraction and validation for project request workbooks
#[derive(Parser)]
#[command(name = "sheetlint")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and validate workbook metadata, writing JSON outputs and registration files
    Lint {
        /// Workbook (.xlsx, .xls, .ods) or directory of per-sheet TSV files
        #[arg(value_name = "WORKBOOK")]
        workbook: PathBuf,

        /// Directory receiving the JSON outputs and audit logs
        #[arg(value_name = "OUTPUT_DIR")]
        output: PathBuf,

        /// Layout configuration (JSON, see `sheetlint config`)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Read the example sheets instead of the templates
        #[arg(long)]
        dry_run: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare a metadata file against a collection in the remote store
    Diff {
        /// Registration metadata file ({"metadataEntries": [...]}), e.g. from <output>/meta
        #[arg(value_name = "METADATA_JSON")]
        file: PathBuf,

        /// Collection path in the remote store (e.g. /CCBR_Archive/PI_Lab)
        #[arg(value_name = "COLLECTION_PATH")]
        collection: String,

        /// Server URL (default: read from $HPC_DM_UTILS)
        #[arg(long, requires = "token")]
        url: Option<String>,

        /// Bearer token (default: read from $HPC_DM_UTILS)
        #[arg(long, requires = "url")]
        token: Option<String>,
    },

    /// Register a prepared metadata tree with the remote store
    Register {
        /// Directory holding <PI>.metadata.json and its subdirectories
        #[arg(value_name = "META_DIR")]
        meta_dir: PathBuf,

        /// Target vault
        #[arg(value_name = "VAULT")]
        vault: String,

        /// Directory holding the sample FASTQ files
        #[arg(value_name = "DATA_DIR")]
        data_dir: PathBuf,

        /// Only update collection metadata, skip data objects
        #[arg(long)]
        update: bool,

        /// Print the planned calls without running them
        #[arg(long)]
        dry_run: bool,

        /// Configuration listing the accepted vaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write every sheet of a workbook as a TSV file
    Convert {
        /// Workbook to convert
        #[arg(value_name = "WORKBOOK")]
        workbook: PathBuf,

        /// Output directory
        #[arg(value_name = "DIR")]
        output: PathBuf,
    },

    /// Print the default configuration as JSON
    Config,
}
