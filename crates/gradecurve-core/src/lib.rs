//! gradecurve-core: grade-distribution aggregation and GPA engine.
//!
//! Takes per-section letter-grade histograms and produces merged, normalized
//! distributions per instructor or course with median and percentile bands,
//! plus credit-hour weighted GPA for a student's completed courses.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod gpa;
pub mod histogram;
pub mod model;
pub mod percentile;
pub mod records;
pub mod report;
pub mod scale;

pub use aggregate::{aggregate, GradeEngine, GroupAggregate, GroupKey};
pub use error::EngineError;
pub use gpa::compute_gpa;
pub use percentile::estimate_percentile;
