//! Config command - print the default configuration.

use sheetlint::LintConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let json = sheetlint::output::to_json_string(&LintConfig::default())?;
    println!("{}", json);
    Ok(())
}
