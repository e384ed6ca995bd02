//! Register command - register a prepared metadata tree.

use std::path::PathBuf;

use colored::Colorize;
use sheetlint::register::{execute, plan_registration, CommandRegistrar, RegistrationStep};
use sheetlint::LintConfig;

pub fn run(
    meta_dir: PathBuf,
    vault: String,
    data_dir: PathBuf,
    update: bool,
    dry_run: bool,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => LintConfig::from_path(&path)?,
        None => LintConfig::default(),
    };
    config.check_vault(&vault)?;

    if !meta_dir.is_dir() {
        return Err(format!("Metadata directory not found: {}", meta_dir.display()).into());
    }

    let steps = plan_registration(&meta_dir, &vault, &data_dir, update)?;
    let objects = steps
        .iter()
        .filter(|s| matches!(s, RegistrationStep::DataObject { .. }))
        .count();

    println!(
        "{} {} collections and {} data objects in {}",
        if dry_run { "Would register".cyan().bold() } else { "Registering".cyan().bold() },
        (steps.len() - objects).to_string().white().bold(),
        objects.to_string().white().bold(),
        vault.white()
    );

    if dry_run {
        for step in &steps {
            println!("  {}", step.target());
        }
        return Ok(());
    }

    execute(&steps, &CommandRegistrar::new())?;

    println!("{}", "Registration complete.".green());
    Ok(())
}
