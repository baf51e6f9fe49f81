pub mod html;
pub mod json;
pub mod junit;

use crate::runner::state::SuiteResult;
use anyhow::{Context, Result};
use std::path::Path;

/// Regenerate a report from a saved `test-results.json`
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let results = json::load(results_path)?;

    match format {
        "json" => json::generate(&results, output),
        "html" => html::generate(&results, output),
        "junit" => junit::generate(&results, output),
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write JSON, HTML and JUnit reports into the output directory
pub fn write_all(results: &SuiteResult, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    json::generate(results, Some(&output_dir.join("test-results.json")))?;
    html::generate(results, Some(&output_dir.join("report.html")))?;
    junit::write_report(results, output_dir)?;
    Ok(())
}
