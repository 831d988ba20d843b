//! The `gradecurve aggregate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradecurve_core::config::load_config_from;
use gradecurve_core::model::{GroupBy, SemesterId};
use gradecurve_core::records::load_records_from;
use gradecurve_core::report::GradeReport;
use gradecurve_core::GradeEngine;

#[allow(clippy::too_many_arguments)]
pub fn execute(
    records_path: PathBuf,
    group_by: String,
    include_pandemic: Option<bool>,
    include_honors: bool,
    semesters: Option<String>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let group_by: GroupBy = group_by.parse().map_err(|e: String| anyhow::anyhow!("{}", e))?;
    anyhow::ensure!(
        matches!(format.as_str(), "table" | "json" | "markdown" | "md"),
        "unknown format '{format}' (expected table, json or markdown)"
    );

    let config = load_config_from(config_path.as_deref())?;

    let mut filters = config.filters.clone();
    if let Some(include) = include_pandemic {
        filters.include_pandemic_semesters = include;
    }
    if include_honors {
        filters.include_honors_sections = true;
    }
    if let Some(list) = &semesters {
        filters.semester_allowlist = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SemesterId::from)
            .collect();
    }

    let records = load_records_from(&records_path)?;
    tracing::info!("loaded {} grade records", records.len());

    let engine = GradeEngine::new(config)?;
    let groups = engine.aggregate(&records, group_by, &filters)?;
    let report = GradeReport::new(group_by, filters, records.len(), groups);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_table(&report),
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_table(report: &GradeReport) {
    use comfy_table::{Cell, Table};

    if report.groups.is_empty() {
        println!("No grade data found");
        return;
    }

    let widths: Vec<f64> = report.groups[0]
        .percentile_bands
        .iter()
        .map(|b| b.width)
        .collect();

    let mut header = vec![
        "Group".to_string(),
        "Sections".to_string(),
        "Mean".to_string(),
        "Median".to_string(),
    ];
    header.extend(widths.iter().map(|w| format!("Middle {w}%")));

    let mut table = Table::new();
    table.set_header(header);

    for g in &report.groups {
        let mut row = vec![
            Cell::new(g.key.to_string()),
            Cell::new(g.count),
            Cell::new(format!("{:.2}", g.mean)),
            Cell::new(format!("{:.2}", g.median)),
        ];
        for width in &widths {
            let band = g
                .percentile_bands
                .iter()
                .find(|b| b.width == *width)
                .map(|b| format!("{:.2}-{:.2}", b.lower, b.upper))
                .unwrap_or_else(|| "-".to_string());
            row.push(Cell::new(band));
        }
        table.add_row(row);
    }

    println!("{table}");
}
