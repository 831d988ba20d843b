//! The `gradecurve validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradecurve_core::records::{load_records_from, validate_records};

pub fn execute(records_path: PathBuf) -> Result<()> {
    let records = load_records_from(&records_path)?;
    println!("Records: {} ({} sections)", records_path.display(), records.len());

    let warnings = validate_records(&records);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.index, w.message);
    }

    if warnings.is_empty() {
        println!("All records valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
