//! The `gradecurve init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("gradecurve.toml").exists() {
        println!("gradecurve.toml already exists, skipping.");
    } else {
        std::fs::write("gradecurve.toml", SAMPLE_CONFIG)?;
        println!("Created gradecurve.toml");
    }

    std::fs::create_dir_all("records")?;
    let example_path = std::path::Path::new("records/example.json");
    if example_path.exists() {
        println!("records/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_RECORDS)?;
        println!("Created records/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Run: gradecurve validate --records records/example.json");
    println!("  2. Run: gradecurve aggregate --records records/example.json --group-by course");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradecurve configuration

# Semesters dropped when include_pandemic_semesters is false
pandemic_semesters = ["Spring 2020", "Summer 2020", "Fall 2020", "Spring 2021"]

# Central-mass widths (percent) for percentile bands
percentile_widths = [90, 75, 50, 25]

# Build a GPA histogram from letter grades when a record has none
derive_missing_gpa_histograms = false

[filters]
include_pandemic_semesters = true
include_honors_sections = false
semester_allowlist = []
"#;

const EXAMPLE_RECORDS: &str = r#"[
  {
    "instructor_key": "Grace Hopper",
    "course_key": "CS 18000",
    "section_label": "LEC 001",
    "semester": "Fall 2022",
    "grade_histogram": [["A", 40], ["B", 30], ["C", 20], ["D", 5], ["F", 3], ["W", 2]],
    "gpa_histogram": [[4.0, 40], [3.0, 30], [2.0, 20], [1.0, 5], [0.0, 3]]
  },
  {
    "instructor_key": "Alan Turing",
    "course_key": "CS 18000",
    "section_label": "LEC 002",
    "semester": "Fall 2022",
    "grade_histogram": [["A", 25], ["B", 35], ["C", 25], ["D", 10], ["F", 5]],
    "gpa_histogram": [[4.0, 25], [3.0, 35], [2.0, 25], [1.0, 10], [0.0, 5]]
  },
  {
    "instructor_key": "Grace Hopper",
    "course_key": "CS 25000",
    "section_label": "LEC 001",
    "semester": "Spring 2023",
    "grade_histogram": [["A", 30], ["B", 40], ["C", 25], ["F", 5]],
    "gpa_histogram": [[4.0, 30], [3.0, 40], [2.0, 25], [0.0, 5]]
  }
]
"#;
