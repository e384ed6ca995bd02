//! Convert command - write every sheet of a workbook as TSV.

use std::path::PathBuf;

use colored::Colorize;
use sheetlint::input::write_sheets_as_tsv;
use sheetlint::load_workbook;

pub fn run(workbook: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !workbook.exists() {
        return Err(format!("Workbook not found: {}", workbook.display()).into());
    }

    let (book, source) = load_workbook(&workbook)?;
    let written = write_sheets_as_tsv(&book, &output)?;

    println!(
        "{} {} sheets from {}",
        "Converted".green().bold(),
        written.len().to_string().white().bold(),
        source.file.white()
    );
    for path in written {
        println!("  {}", path.display());
    }

    Ok(())
}
