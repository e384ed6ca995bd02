//! Lint command - extract, propagate and validate a workbook.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use sheetlint::{LintConfig, Linter, Severity, METADATA_DIR};

pub fn run(
    workbook: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    dry_run: bool,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !workbook.exists() {
        return Err(format!("Workbook not found: {}", workbook.display()).into());
    }

    let config = match config {
        Some(path) => LintConfig::from_path(&path)?,
        None => LintConfig::default(),
    };
    let linter = Linter::with_config(config)?;

    if !output.exists() {
        eprintln!(
            "{} output directory {} does not exist, creating it",
            "WARNING:".yellow().bold(),
            output.display()
        );
        fs::create_dir_all(&output)?;
    }

    if !json_output {
        println!(
            "{} {}{}",
            "Linting".cyan().bold(),
            workbook.display().to_string().white(),
            if dry_run { " (dry run)".dimmed().to_string() } else { String::new() }
        );
    }

    let result = linter.lint_file(&workbook, Some(&output), dry_run)?;
    let written = result.write_outputs(&output)?;
    let metadata_dir = output.join(METADATA_DIR);
    let metadata_files = result.write_metadata(&metadata_dir, &linter.config().entity_names)?;
    let summary = result.summary();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if verbose {
        if let Some(source) = &result.source {
            println!();
            println!("{}", "Source:".yellow().bold());
            println!("  Format: {}", source.format);
            println!("  Sheets: {}", source.sheet_count);
            println!("  Hash:   {}", source.hash.dimmed());
        }
    }

    println!();
    println!(
        "Dictionary fields: {}",
        summary.dictionary_fields.to_string().white().bold()
    );
    println!(
        "PI_Lab fields: {}  Project fields: {}  Samples: {}",
        summary.pi_fields.to_string().white().bold(),
        summary.project_fields.to_string().white().bold(),
        summary.samples.to_string().white().bold()
    );
    println!(
        "Estimated sub-projects: {}",
        summary.subproject_estimate.to_string().white()
    );

    if !result.report.observations.is_empty() {
        println!();
        for observation in &result.report.observations {
            let prefix = match observation.severity {
                Severity::Warning => "WARNING:".yellow().bold(),
                Severity::Info => "INFO:".blue().bold(),
            };
            println!("{} {}", prefix, observation.description);
        }
    }

    println!();
    if result.report.missing.is_empty() {
        println!("{}", "All required fields provided.".green());
    } else {
        println!(
            "{} {}",
            "Missing required fields:".yellow().bold(),
            result
                .report
                .missing
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!();
    for path in written {
        println!("{} {}", "Wrote".green().bold(), path.display().to_string().white());
    }
    println!(
        "{} {} registration files under {}",
        "Wrote".green().bold(),
        metadata_files.len().to_string().white().bold(),
        metadata_dir.display().to_string().white()
    );

    Ok(())
}
