//! Sheetlint CLI - metadata extraction and validation for project request workbooks.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Lint {
            workbook,
            output,
            config,
            dry_run,
            json,
        } => commands::lint::run(workbook, output, config, dry_run, json, cli.verbose),

        Commands::Diff {
            file,
            collection,
            url,
            token,
        } => commands::diff::run(file, collection, url, token, cli.verbose),

        Commands::Register {
            meta_dir,
            vault,
            data_dir,
            update,
            dry_run,
            config,
        } => commands::register::run(meta_dir, vault, data_dir, update, dry_run, config),

        Commands::Convert { workbook, output } => commands::convert::run(workbook, output),

        Commands::Config => commands::config::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
