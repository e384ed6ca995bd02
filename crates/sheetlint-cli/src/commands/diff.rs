//! Diff command - compare a metadata file against the remote store.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use colored::Colorize;
use sheetlint::remote::{diff_attributes, fetch_or_empty, DmeClient, MetadataEntries};

pub fn run(
    file: PathBuf,
    collection: String,
    url: Option<String>,
    token: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Metadata file not found: {}", file.display()).into());
    }

    let local: MetadataEntries = serde_json::from_reader(BufReader::new(File::open(&file)?))?;

    let client = match (url, token) {
        (Some(url), Some(token)) => DmeClient::new(url, token)?,
        _ => DmeClient::from_env()?,
    };

    println!(
        "{} {} {} {}",
        "Comparing".cyan().bold(),
        file.display().to_string().white(),
        "with".cyan(),
        collection.white()
    );

    let (remote, failure) = fetch_or_empty(&client, &collection);
    if let Some(message) = failure {
        eprintln!("{} {}", "WARNING:".yellow().bold(), message);
    }

    let diff = diff_attributes(&remote, &local.metadata_entries);

    println!();
    println!(
        "Remote only: {}  Local only: {}  Shared: {}  Changed: {}",
        diff.remote_only.len().to_string().white().bold(),
        diff.local_only.len().to_string().green().bold(),
        diff.shared.len().to_string().white().bold(),
        diff.changed.len().to_string().yellow().bold()
    );

    if verbose && !diff.remote_only.is_empty() {
        println!();
        println!("{}", "Kept as is:".dimmed());
        for name in &diff.remote_only {
            println!("  {}", name.dimmed());
        }
    }

    if !diff.local_only.is_empty() {
        println!();
        println!("{}", "Would append:".green().bold());
        for attr in &diff.local_only {
            println!("  {} = {}", attr.attribute.white(), attr.value);
        }
    }

    if !diff.changed.is_empty() {
        println!();
        println!("{}", "Would update:".yellow().bold());
        for change in &diff.changed {
            println!(
                "  {}: {} -> {}",
                change.attribute.white(),
                change.remote.red(),
                change.local.green()
            );
        }
    }

    if diff.is_unchanged() {
        println!();
        println!("{}", "No changes.".green());
    }

    Ok(())
}
