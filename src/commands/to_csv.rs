//! to-csv command handler

use anyhow::Result;
use std::path::Path;

use ocitools::export::export_file;

/// Convert an extracted JSON file into CSV.
pub fn handle(input: &Path, output: &Path, quiet: bool) -> Result<()> {
    let stats = export_file(input, output)?;
    if !quiet {
        println!(
            "Extracted {} record{} ({} columns) from {} and saved as {}.",
            stats.rows,
            if stats.rows == 1 { "" } else { "s" },
            stats.columns,
            input.display(),
            output.display()
        );
    }
    Ok(())
}
