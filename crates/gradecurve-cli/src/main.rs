//! gradecurve CLI: grade distributions, percentile bands and GPA from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "gradecurve",
    version,
    about = "Grade-distribution aggregation and GPA estimation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate grade records by instructor or course
    Aggregate {
        /// Path to a .json/.toml records file or a directory of them
        #[arg(long)]
        records: PathBuf,

        /// Grouping dimension: instructor or course
        #[arg(long, default_value = "instructor")]
        group_by: String,

        /// Include pandemic-era semesters (overrides config)
        #[arg(long)]
        include_pandemic: Option<bool>,

        /// Include honors sections
        #[arg(long)]
        include_honors: bool,

        /// Only these semesters (comma-separated, e.g. "Fall 2022,Spring 2023")
        #[arg(long)]
        semesters: Option<String>,

        /// Output format: table, json, markdown
        #[arg(long, default_value = "table")]
        format: String,

        /// Also save the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute a credit-hour weighted GPA from a transcript
    Gpa {
        /// Path to a .json/.toml transcript
        #[arg(long)]
        transcript: PathBuf,

        /// Only courses from this semester
        #[arg(long, conflicts_with = "courses")]
        semester: Option<String>,

        /// Only these course keys (comma-separated)
        #[arg(long)]
        courses: Option<String>,
    },

    /// Estimate a percentile of a weighted distribution
    Percentile {
        /// Buckets as value:weight pairs, e.g. "2.0:0.25,3.0:0.5,4.0:0.25"
        #[arg(long)]
        distribution: String,

        /// Target percentile in [0, 1]
        #[arg(long, default_value = "0.5")]
        target: f64,
    },

    /// Validate grade record files
    Validate {
        /// Path to a records file or directory
        #[arg(long)]
        records: PathBuf,
    },

    /// Create starter config and example records
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradecurve=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Aggregate {
            records,
            group_by,
            include_pandemic,
            include_honors,
            semesters,
            format,
            output,
            config,
        } => commands::aggregate::execute(
            records,
            group_by,
            include_pandemic,
            include_honors,
            semesters,
            format,
            output,
            config,
        ),
        Commands::Gpa {
            transcript,
            semester,
            courses,
        } => commands::gpa::execute(transcript, semester, courses),
        Commands::Percentile {
            distribution,
            target,
        } => commands::percentile::execute(distribution, target),
        Commands::Validate { records } => commands::validate::execute(records),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
