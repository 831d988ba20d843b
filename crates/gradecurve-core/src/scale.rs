//! Letter-grade codes and the quality-point scale.
//!
//! The scale is a fixed table. Codes outside it (withdrawals, pass/fail,
//! incomplete, audit, transfer credit, ...) carry no quality points and are
//! left out of GPA math entirely.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The highest quality-point value on the scale.
pub const MAX_GPA: f64 = 4.0;

/// Recognized letter grades in display order, with their quality points.
const GRADE_POINTS: &[(&str, f64)] = &[
    ("A+", 4.0),
    ("A", 4.0),
    ("A-", 3.7),
    ("B+", 3.3),
    ("B", 3.0),
    ("B-", 2.7),
    ("C+", 2.3),
    ("C", 2.0),
    ("C-", 1.7),
    ("D+", 1.3),
    ("D", 1.0),
    ("D-", 0.7),
    ("E", 0.0),
    ("F", 0.0),
    ("IF", 0.0),
];

/// A normalized letter-grade code (trimmed, upper-case).
///
/// Codes order by their position on the scale, then non-GPA codes
/// alphabetically, so histograms keyed by `GradeCode` iterate in the order a
/// grade distribution is usually read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct GradeCode(String);

impl GradeCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn rank(&self) -> usize {
        GRADE_POINTS
            .iter()
            .position(|(letter, _)| *letter == self.0)
            .unwrap_or(GRADE_POINTS.len())
    }
}

impl Ord for GradeCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for GradeCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<String> for GradeCode {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<&str> for GradeCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<GradeCode> for String {
    fn from(code: GradeCode) -> Self {
        code.0
    }
}

impl fmt::Display for GradeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A GPA bucket value, stored in hundredths so it can key an ordered map.
///
/// Values are rounded to the nearest hundredth: `3.667` becomes `3.67`, and
/// two inputs that round to the same hundredth share one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct GpaValue(u16);

impl GpaValue {
    /// Build a bucket value from quality points; `None` if outside `[0.0, 4.0]`.
    pub fn new(points: f64) -> Option<Self> {
        if !points.is_finite() || !(0.0..=MAX_GPA).contains(&points) {
            return None;
        }
        Some(Self((points * 100.0).round() as u16))
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl TryFrom<f64> for GpaValue {
    type Error = String;

    fn try_from(points: f64) -> Result<Self, Self::Error> {
        GpaValue::new(points).ok_or_else(|| format!("GPA value {points} outside [0, {MAX_GPA}]"))
    }
}

impl From<GpaValue> for f64 {
    fn from(value: GpaValue) -> Self {
        value.as_f64()
    }
}

impl fmt::Display for GpaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_f64())
    }
}

/// Maps letter-grade codes to quality points.
#[derive(Debug, Clone, Copy)]
pub struct GradeScale {
    table: &'static [(&'static str, f64)],
}

impl GradeScale {
    /// The standard 4.0 scale.
    pub const fn standard() -> Self {
        Self {
            table: GRADE_POINTS,
        }
    }

    /// Quality points for a grade code, or `None` when the code does not count
    /// toward GPA.
    pub fn points_for(&self, code: &str) -> Option<f64> {
        let code = code.trim().to_uppercase();
        self.table
            .iter()
            .find(|(letter, _)| *letter == code)
            .map(|(_, points)| *points)
    }

    pub fn is_gpa_grade(&self, code: &str) -> bool {
        self.points_for(code).is_some()
    }

    /// Recognized letters in display order.
    pub fn letters(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.iter().map(|(letter, _)| *letter)
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::standard()
    }
}
