//! Grade-record and transcript loading, plus record validation.
//!
//! Files are JSON (a top-level array) or TOML (`[[records]]` / `[[courses]]`
//! tables), chosen by extension.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::histogram::{GpaHistogram, GradeHistogram};
use crate::model::{CompletedCourse, GradeRecord};

#[derive(Debug, Deserialize)]
struct TomlRecordFile {
    #[serde(default)]
    records: Vec<GradeRecord>,
}

#[derive(Debug, Deserialize)]
struct TomlTranscriptFile {
    #[serde(default)]
    courses: Vec<CompletedCourse>,
}

fn read_list<T, F>(path: &Path, from_toml: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnOnce(&str) -> Result<Vec<T>, toml::de::Error>,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display())),
        Some("toml") => {
            from_toml(&content).with_context(|| format!("failed to parse TOML: {}", path.display()))
        }
        _ => anyhow::bail!(
            "unsupported file type (expected .json or .toml): {}",
            path.display()
        ),
    }
}

/// Load grade records from a single `.json` or `.toml` file.
pub fn load_records(path: &Path) -> Result<Vec<GradeRecord>> {
    read_list(path, |s| toml::from_str::<TomlRecordFile>(s).map(|f| f.records))
}

/// Recursively load grade records from every `.json`/`.toml` file in `dir`.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_record_directory(dir: &Path) -> Result<Vec<GradeRecord>> {
    let mut records = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            records.extend(load_record_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "toml")
        {
            match load_records(&path) {
                Ok(loaded) => records.extend(loaded),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(records)
}

/// Load records from a file or a directory.
pub fn load_records_from(path: &Path) -> Result<Vec<GradeRecord>> {
    if path.is_dir() {
        load_record_directory(path)
    } else {
        load_records(path)
    }
}

/// Load a student's completed courses from a `.json` or `.toml` file.
pub fn load_transcript(path: &Path) -> Result<Vec<CompletedCourse>> {
    read_list(path, |s| {
        toml::from_str::<TomlTranscriptFile>(s).map(|f| f.courses)
    })
}

/// A warning from record validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Position of the record in the input.
    pub index: usize,
    /// Warning message.
    pub message: String,
}

/// Check records for problems that would distort or abort an aggregation.
pub fn validate_records(records: &[GradeRecord]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let identity = (
            &record.instructor_key,
            &record.course_key,
            &record.section_label,
            &record.semester,
        );
        if !seen.insert(identity) {
            warnings.push(ValidationWarning {
                index,
                message: format!("duplicate section: {}", record.describe()),
            });
        }

        let context = record.describe();
        match GradeHistogram::from_pairs(record.grade_histogram.iter().cloned(), &context) {
            Ok(h) if h.total() <= 0.0 => warnings.push(ValidationWarning {
                index,
                message: format!("empty grade histogram: {context}"),
            }),
            Ok(_) => {}
            Err(e) => warnings.push(ValidationWarning {
                index,
                message: e.to_string(),
            }),
        }

        if let Some(pairs) = &record.gpa_histogram {
            if let Err(e) = GpaHistogram::from_gpa_pairs(pairs, &context) {
                warnings.push(ValidationWarning {
                    index,
                    message: e.to_string(),
                });
            }
        }

        if let Some(enrollment) = record.enrollment {
            if !enrollment.is_finite() || enrollment < 0.0 {
                warnings.push(ValidationWarning {
                    index,
                    message: format!("invalid enrollment {enrollment}: {context}"),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDS_JSON: &str = r#"[
        {
            "instructor_key": "X",
            "course_key": "CS 18000",
            "section_label": "LEC 001",
            "semester": "Fall 2022",
            "grade_histogram": [["A", 10], ["B", 5]],
            "gpa_histogram": [[4.0, 10], [3.0, 5]]
        },
        {
            "instructor_key": "Y",
            "course_key": "CS 18000",
            "section_label": "LEC 002",
            "semester": "Fall 2022",
            "grade_histogram": [["P", 12]]
        }
    ]"#;

    const RECORDS_TOML: &str = r#"
[[records]]
instructor_key = "Z"
course_key = "MA 16100"
section_label = "LEC"
semester = "Spring 2023"
grade_histogram = [["A", 3.0], ["C", 1.0]]
gpa_histogram = [[4.0, 3.0], [2.0, 1.0]]
enrollment = 4.0
"#;

    #[test]
    fn load_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, RECORDS_JSON).unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].gpa_histogram.is_none());
    }

    #[test]
    fn load_toml_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.toml");
        std::fs::write(&path, RECORDS_TOML).unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].enrollment, Some(4.0));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), RECORDS_JSON).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/b.toml"), RECORDS_TOML).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = load_records_from(dir.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn unsupported_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        std::fs::write(&path, "a,b").unwrap();
        assert!(load_records(&path).is_err());
    }

    #[test]
    fn load_transcript_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.toml");
        std::fs::write(
            &path,
            r#"
[[courses]]
grade_code = "A"
credit_hours = 3
course_key = "CS 18000"
semester = "Fall 2022"

[[courses]]
grade_code = "W"
credit_hours = 4
"#,
        )
        .unwrap();

        let courses = load_transcript(&path).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].credit_hours, 3.0);
        assert!(courses[1].semester.is_none());
    }

    #[test]
    fn validate_flags_problems() {
        let mut records: Vec<GradeRecord> = serde_json::from_str(RECORDS_JSON).unwrap();
        records.push(records[0].clone());
        records[1].grade_histogram.clear();
        records[0].gpa_histogram = Some(vec![(5.0, 1.0)]);

        let warnings = validate_records(&records);
        assert!(warnings.iter().any(|w| w.index == 2 && w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.index == 1 && w.message.contains("empty")));
        assert!(warnings.iter().any(|w| w.index == 0 && w.message.contains("outside")));
    }

    #[test]
    fn validate_clean_records() {
        let records: Vec<GradeRecord> = serde_json::from_str(RECORDS_JSON).unwrap();
        assert!(validate_records(&records).is_empty());
    }
}
