//! The `gradecurve gpa` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use gradecurve_core::gpa::{compute_gpa, semester_gpa, subset_gpa};
use gradecurve_core::model::SemesterId;
use gradecurve_core::records::load_transcript;

pub fn execute(
    transcript_path: PathBuf,
    semester: Option<String>,
    courses: Option<String>,
) -> Result<()> {
    let transcript = load_transcript(&transcript_path)?;

    let gpa = match (&semester, &courses) {
        (Some(semester), _) => semester_gpa(&transcript, &SemesterId::from(semester.as_str())),
        (None, Some(list)) => {
            let keys: HashSet<String> = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            subset_gpa(&transcript, &keys)
        }
        (None, None) => compute_gpa(&transcript),
    };

    match gpa {
        Some(value) => println!("GPA: {value:.2}"),
        None => println!("No GPA data"),
    }

    Ok(())
}
