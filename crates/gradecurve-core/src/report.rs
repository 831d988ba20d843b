//! Aggregation report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::GroupAggregate;
use crate::model::{FilterConfig, GroupBy};

/// A complete aggregation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Grouping dimension used.
    pub group_by: GroupBy,
    /// Filters applied before aggregation.
    pub filters: FilterConfig,
    /// Number of records supplied (before filtering).
    pub record_count: usize,
    /// Group summaries, `all` first.
    pub groups: Vec<GroupAggregate>,
}

impl GradeReport {
    pub fn new(
        group_by: GroupBy,
        filters: FilterConfig,
        record_count: usize,
        groups: Vec<GroupAggregate>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            group_by,
            filters,
            record_count,
            groups,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Grades by {}:** {} groups from {} records\n\n",
            self.group_by,
            self.groups.len().saturating_sub(1),
            self.record_count
        ));

        if self.groups.is_empty() {
            md.push_str("No grade data found.\n");
            return md;
        }

        md.push_str("| Group | Sections | Mean | Median | Middle 50% |\n");
        md.push_str("|-------|----------|------|--------|------------|\n");
        for g in &self.groups {
            let iqr = g
                .percentile_bands
                .iter()
                .find(|b| (b.width - 50.0).abs() < f64::EPSILON)
                .map(|b| format!("{:.2}-{:.2}", b.lower, b.upper))
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} | {} |\n",
                g.key, g.count, g.mean, g.median, iqr
            ));
        }
        md.push('\n');

        md.push_str("### Grade distributions\n\n");
        for g in &self.groups {
            let cells: Vec<String> = g
                .grade_histogram
                .percentages()
                .into_iter()
                .map(|(code, pct)| format!("{code} {pct:.1}%"))
                .collect();
            md.push_str(&format!("- **{}**: {}\n", g.key, cells.join(", ")));
        }

        md
    }
}
