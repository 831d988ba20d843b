//! Core data model types for gradecurve.
//!
//! These are the input records supplied by the grade-report and
//! academic-history sources, plus the options that select how they are
//! grouped and filtered.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scale::GradeCode;

/// A semester identifier such as `"Fall 2020"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SemesterId(String);

impl SemesterId {
    pub fn new(id: &str) -> Self {
        Self(id.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SemesterId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<&str> for SemesterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<SemesterId> for String {
    fn from(id: SemesterId) -> Self {
        id.0
    }
}

impl fmt::Display for SemesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grade outcomes for one section offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    /// Instructor identity (grouping key for [`GroupBy::Instructor`]).
    pub instructor_key: String,
    /// Course identity, e.g. `"CS 18000"` (grouping key for [`GroupBy::Course`]).
    pub course_key: String,
    /// Section name as published, e.g. `"LEC 001"` or `"Honors LEC"`.
    pub section_label: String,
    /// Semester the section ran in.
    pub semester: SemesterId,
    /// `(letter, weight)` pairs; weights are counts or fractions.
    pub grade_histogram: Vec<(GradeCode, f64)>,
    /// `(gpa, weight)` pairs. Absent for pass/fail-only sections.
    #[serde(default)]
    pub gpa_histogram: Option<Vec<(f64, f64)>>,
    /// Number of students. When present the histograms are read as shares of
    /// this enrollment and the record is weighted by it.
    #[serde(default)]
    pub enrollment: Option<f64>,
}

impl GradeRecord {
    /// Weight this record carries when folded into a group. Without an
    /// enrollment the histogram weights are taken as they are.
    pub fn merge_weight(&self) -> f64 {
        self.enrollment.unwrap_or(1.0)
    }

    pub fn is_honors(&self) -> bool {
        self.section_label.to_lowercase().contains("honor")
    }

    /// Short description used in error messages and warnings.
    pub fn describe(&self) -> String {
        format!(
            "{} / {} / {} ({})",
            self.course_key, self.instructor_key, self.section_label, self.semester
        )
    }
}

/// One completed course on a student's record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedCourse {
    pub grade_code: String,
    pub credit_hours: f64,
    #[serde(default)]
    pub course_key: Option<String>,
    #[serde(default)]
    pub semester: Option<SemesterId>,
}

impl CompletedCourse {
    pub fn new(grade_code: &str, credit_hours: f64) -> Self {
        Self {
            grade_code: grade_code.to_string(),
            credit_hours,
            course_key: None,
            semester: None,
        }
    }
}

/// The dimension grade records are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Instructor,
    Course,
}

impl GroupBy {
    /// The grouping key of a record under this dimension.
    pub fn key_of<'a>(&self, record: &'a GradeRecord) -> &'a str {
        match self {
            GroupBy::Instructor => &record.instructor_key,
            GroupBy::Course => &record.course_key,
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Instructor => write!(f, "instructor"),
            GroupBy::Course => write!(f, "course"),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instructor" | "professor" => Ok(GroupBy::Instructor),
            "course" => Ok(GroupBy::Course),
            other => Err(format!("unknown grouping: {other}")),
        }
    }
}

/// Which records take part in an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Keep records from semesters in the configured pandemic set.
    #[serde(default = "default_true")]
    pub include_pandemic_semesters: bool,
    /// Keep sections whose label mentions "honor".
    #[serde(default)]
    pub include_honors_sections: bool,
    /// When non-empty, only these semesters are kept.
    #[serde(default)]
    pub semester_allowlist: BTreeSet<SemesterId>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_pandemic_semesters: true,
            include_honors_sections: false,
            semester_allowlist: BTreeSet::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
