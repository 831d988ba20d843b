//! Credit-hour weighted GPA.
//!
//! A course counts only if its grade code carries quality points; everything
//! else (W, P, I, AU, TR, ...) is left out of both the numerator and the
//! denominator. A record with no gradable hours has no GPA, which is reported
//! as `None` rather than as zero.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{CompletedCourse, SemesterId};
use crate::scale::GradeScale;

/// Running quality points and GPA hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpaTally {
    /// Σ(points × credit hours).
    pub quality_points: f64,
    /// Σ(credit hours) over gradable courses.
    pub gpa_hours: f64,
}

impl GpaTally {
    /// Tally a sequence of courses on the given scale.
    pub fn from_courses<'a, I>(courses: I, scale: &GradeScale) -> Self
    where
        I: IntoIterator<Item = &'a CompletedCourse>,
    {
        let mut tally = Self::default();
        for course in courses {
            tally.add(course, scale);
        }
        tally
    }

    /// Add one course; returns `false` if it does not count toward GPA.
    pub fn add(&mut self, course: &CompletedCourse, scale: &GradeScale) -> bool {
        let Some(points) = scale.points_for(&course.grade_code) else {
            tracing::debug!("grade {} excluded from GPA", course.grade_code);
            return false;
        };
        self.quality_points += points * course.credit_hours;
        self.gpa_hours += course.credit_hours;
        true
    }

    /// Combine two tallies, e.g. a major's courses and a concentration's.
    pub fn merge(&mut self, other: &GpaTally) {
        self.quality_points += other.quality_points;
        self.gpa_hours += other.gpa_hours;
    }

    pub fn gpa(&self) -> Option<f64> {
        if self.gpa_hours > 0.0 {
            Some(self.quality_points / self.gpa_hours)
        } else {
            None
        }
    }
}

/// Cumulative GPA over all completed courses.
pub fn compute_gpa(courses: &[CompletedCourse]) -> Option<f64> {
    GpaTally::from_courses(courses, &GradeScale::standard()).gpa()
}

/// GPA over the courses taken in one semester.
pub fn semester_gpa(courses: &[CompletedCourse], semester: &SemesterId) -> Option<f64> {
    GpaTally::from_courses(
        courses
            .iter()
            .filter(|c| c.semester.as_ref() == Some(semester)),
        &GradeScale::standard(),
    )
    .gpa()
}

/// GPA over the courses whose key is in `course_keys`, such as a major's
/// requirement list.
pub fn subset_gpa(courses: &[CompletedCourse], course_keys: &HashSet<String>) -> Option<f64> {
    GpaTally::from_courses(
        courses.iter().filter(|c| {
            c.course_key
                .as_ref()
                .is_some_and(|key| course_keys.contains(key))
        }),
        &GradeScale::standard(),
    )
    .gpa()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(grade: &str, hours: f64, key: &str, semester: &str) -> CompletedCourse {
        CompletedCourse {
            grade_code: grade.into(),
            credit_hours: hours,
            course_key: Some(key.into()),
            semester: Some(semester.into()),
        }
    }

    #[test]
    fn equal_hours_average() {
        let courses = vec![
            CompletedCourse::new("A", 3.0),
            CompletedCourse::new("B", 3.0),
            CompletedCourse::new("C", 3.0),
        ];
        assert_eq!(compute_gpa(&courses), Some(3.0));
    }

    #[test]
    fn weighted_by_credit_hours() {
        let courses = vec![CompletedCourse::new("A", 4.0), CompletedCourse::new("C", 1.0)];
        let gpa = compute_gpa(&courses).unwrap();
        assert!((gpa - 3.6).abs() < 1e-12);
    }

    #[test]
    fn only_non_gpa_codes_is_no_data() {
        assert_eq!(compute_gpa(&[CompletedCourse::new("W", 3.0)]), None);
        assert_eq!(compute_gpa(&[]), None);
    }

    #[test]
    fn non_gpa_codes_are_skipped() {
        let courses = vec![
            CompletedCourse::new("A-", 3.0),
            CompletedCourse::new("P", 3.0),
            CompletedCourse::new("W", 4.0),
        ];
        let gpa = compute_gpa(&courses).unwrap();
        assert!((gpa - 3.7).abs() < 1e-12);
    }

    #[test]
    fn failing_grades_count() {
        let courses = vec![CompletedCourse::new("A", 3.0), CompletedCourse::new("F", 3.0)];
        assert_eq!(compute_gpa(&courses), Some(2.0));
    }

    #[test]
    fn order_independent() {
        let mut courses = vec![
            CompletedCourse::new("B+", 3.0),
            CompletedCourse::new("D", 2.0),
            CompletedCourse::new("A", 4.0),
        ];
        let forward = compute_gpa(&courses).unwrap();
        courses.reverse();
        let backward = compute_gpa(&courses).unwrap();
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn semester_and_subset() {
        let courses = vec![
            course("A", 4.0, "CS 18000", "Fall 2022"),
            course("C", 3.0, "MA 16100", "Fall 2022"),
            course("B", 3.0, "CS 24000", "Spring 2023"),
        ];

        let fall = semester_gpa(&courses, &SemesterId::from("Fall 2022")).unwrap();
        assert!((fall - 22.0 / 7.0).abs() < 1e-12);
        assert_eq!(semester_gpa(&courses, &"Fall 2030".into()), None);

        let major: HashSet<String> = ["CS 18000", "CS 24000"].iter().map(|s| s.to_string()).collect();
        let cs = subset_gpa(&courses, &major).unwrap();
        assert!((cs - 25.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn tallies_merge() {
        let scale = GradeScale::standard();
        let mut major = GpaTally::from_courses(&[CompletedCourse::new("A", 3.0)], &scale);
        let concentration = GpaTally::from_courses(&[CompletedCourse::new("C", 3.0)], &scale);
        major.merge(&concentration);
        assert_eq!(major.gpa(), Some(3.0));
        assert_eq!(major.gpa_hours, 6.0);
    }

    #[test]
    fn add_reports_whether_course_counted() {
        let scale = GradeScale::standard();
        let mut tally = GpaTally::default();
        assert!(tally.add(&CompletedCourse::new("B", 3.0), &scale));
        assert!(!tally.add(&CompletedCourse::new("AU", 3.0), &scale));
        assert_eq!(tally.gpa_hours, 3.0);
    }
}
