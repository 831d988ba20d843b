//! Grouping of grade records into per-instructor or per-course aggregates.
//!
//! Every record that survives filtering is folded into its own group and into
//! the synthetic `all` group. Once folding is done each group's histograms are
//! normalized and its mean, median and percentile bands are derived.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::histogram::{derive_gpa_histogram, merge, GpaHistogram, GradeHistogram};
use crate::model::{FilterConfig, GradeRecord, GroupBy};
use crate::percentile::{estimate_percentile, percentile_bands, PercentileBand};
use crate::scale::GradeScale;

/// Identity of an aggregate group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    /// Every record that passed the filters.
    All,
    /// One instructor or one course.
    Member(String),
}

impl GroupKey {
    pub fn is_all(&self) -> bool {
        matches!(self, GroupKey::All)
    }
}

/// Renders the synthetic group as `all`. A member whose own name reads
/// `all` is quoted so the two stay distinguishable in tables.
impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::All => write!(f, "all"),
            GroupKey::Member(name) if name.trim().eq_ignore_ascii_case("all") => {
                write!(f, "\"{name}\"")
            }
            GroupKey::Member(name) => write!(f, "{name}"),
        }
    }
}

/// Summary statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAggregate {
    pub key: GroupKey,
    /// Normalized letter-grade distribution.
    pub grade_histogram: GradeHistogram,
    /// Normalized GPA distribution (empty if no member had one).
    pub gpa_histogram: GpaHistogram,
    /// Number of records folded into the group.
    pub count: usize,
    /// Sum of the records' merge weights.
    pub population: f64,
    pub mean: f64,
    pub median: f64,
    pub percentile_bands: Vec<PercentileBand>,
}

/// Running totals for a group while records are being folded.
struct GroupAccumulator {
    key: GroupKey,
    grades: Option<GradeHistogram>,
    gpa: Option<GpaHistogram>,
    count: usize,
    population: f64,
}

impl GroupAccumulator {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            grades: None,
            gpa: None,
            count: 0,
            population: 0.0,
        }
    }

    fn fold(
        &mut self,
        grades: &GradeHistogram,
        gpa: Option<&GpaHistogram>,
        weight: f64,
    ) -> Result<(), EngineError> {
        self.grades = Some(merge(self.grades.take(), grades, weight)?);
        if let Some(gpa) = gpa {
            self.gpa = Some(merge(self.gpa.take(), gpa, weight)?);
        }
        self.count += 1;
        self.population += weight;
        Ok(())
    }

    fn finish(self, widths: &[f64]) -> Result<GroupAggregate, EngineError> {
        let grade_histogram = self.grades.unwrap_or_default().normalized();
        let gpa_histogram = self.gpa.unwrap_or_default().normalized();

        let (mean, median, percentile_bands) = if gpa_histogram.total() > 0.0 {
            let distribution = gpa_histogram.distribution();
            (
                gpa_histogram.weighted_mean(),
                estimate_percentile(&distribution, 0.5),
                percentile_bands(&distribution, widths)?,
            )
        } else {
            (0.0, 0.0, Vec::new())
        };

        Ok(GroupAggregate {
            key: self.key,
            grade_histogram,
            gpa_histogram,
            count: self.count,
            population: self.population,
            mean,
            median,
            percentile_bands,
        })
    }
}

/// The grade-distribution engine.
#[derive(Debug, Clone)]
pub struct GradeEngine {
    config: EngineConfig,
    scale: GradeScale,
}

impl GradeEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            scale: GradeScale::standard(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a record takes part in an aggregation under `filters`.
    pub fn passes_filters(&self, record: &GradeRecord, filters: &FilterConfig) -> bool {
        if !filters.include_pandemic_semesters
            && self.config.pandemic_semesters.contains(&record.semester)
        {
            return false;
        }
        if !filters.semester_allowlist.is_empty()
            && !filters.semester_allowlist.contains(&record.semester)
        {
            return false;
        }
        if !filters.include_honors_sections && record.is_honors() {
            return false;
        }
        true
    }

    /// Group `records` by `group_by` and summarize each group.
    ///
    /// The `all` group comes first; the rest follow by descending median, ties
    /// kept in first-seen order. No records surviving the filters yields an
    /// empty result.
    pub fn aggregate(
        &self,
        records: &[GradeRecord],
        group_by: GroupBy,
        filters: &FilterConfig,
    ) -> Result<Vec<GroupAggregate>, EngineError> {
        let mut all = GroupAccumulator::new(GroupKey::All);
        let mut groups: Vec<GroupAccumulator> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut dropped = 0usize;

        for record in records {
            if !self.passes_filters(record, filters) {
                dropped += 1;
                continue;
            }

            let context = record.describe();
            let grades =
                GradeHistogram::from_pairs(record.grade_histogram.iter().cloned(), &context)?;
            let gpa = self.gpa_histogram_for(record, &grades, &context)?;
            // With an enrollment the histograms become shares of that
            // enrollment, otherwise their raw counts carry the weight.
            let (grades, gpa) = if record.enrollment.is_some() {
                (grades.normalized(), gpa.map(|h| h.normalized()))
            } else {
                (grades, gpa)
            };
            let weight = record.merge_weight();
            if gpa.is_none() {
                tracing::debug!("no GPA histogram for {context}, skipping GPA merge");
            }

            all.fold(&grades, gpa.as_ref(), weight)?;

            let key = group_by.key_of(record);
            let slot = *index.entry(key.to_string()).or_insert_with(|| {
                groups.push(GroupAccumulator::new(GroupKey::Member(key.to_string())));
                groups.len() - 1
            });
            groups[slot].fold(&grades, gpa.as_ref(), weight)?;
        }

        tracing::debug!(
            "aggregated {} records by {group_by} into {} groups ({dropped} filtered out)",
            all.count,
            groups.len(),
        );

        if all.count == 0 {
            return Ok(Vec::new());
        }

        let widths = &self.config.percentile_widths;
        let mut ranked = groups
            .into_iter()
            .map(|g| g.finish(widths))
            .collect::<Result<Vec<_>, _>>()?;
        ranked.sort_by(|a, b| b.median.total_cmp(&a.median));

        let mut result = Vec::with_capacity(ranked.len() + 1);
        result.push(all.finish(widths)?);
        result.extend(ranked);
        Ok(result)
    }

    fn gpa_histogram_for(
        &self,
        record: &GradeRecord,
        grades: &GradeHistogram,
        context: &str,
    ) -> Result<Option<GpaHistogram>, EngineError> {
        match &record.gpa_histogram {
            Some(pairs) => Ok(Some(GpaHistogram::from_gpa_pairs(pairs, context)?)),
            None if self.config.derive_missing_gpa_histograms => {
                let derived = derive_gpa_histogram(grades, &self.scale);
                Ok((derived.total() > 0.0).then_some(derived))
            }
            None => Ok(None),
        }
    }
}

impl Default for GradeEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            scale: GradeScale::standard(),
        }
    }
}

/// Aggregate with the default engine configuration.
pub fn aggregate(
    records: &[GradeRecord],
    group_by: GroupBy,
    filters: &FilterConfig,
) -> Result<Vec<GroupAggregate>, EngineError> {
    GradeEngine::default().aggregate(records, group_by, filters)
}
