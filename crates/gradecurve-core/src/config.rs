//! Engine configuration and loading.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{FilterConfig, SemesterId};
use crate::percentile::{validate_width, DEFAULT_PERCENTILE_WIDTHS};

/// Configuration for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Semesters dropped when `include_pandemic_semesters` is false.
    #[serde(default = "default_pandemic_semesters")]
    pub pandemic_semesters: BTreeSet<SemesterId>,
    /// Band widths in percent, e.g. 50 for the interquartile band.
    #[serde(default = "default_percentile_widths")]
    pub percentile_widths: Vec<f64>,
    /// Derive a GPA histogram from the letter histogram when a record has none.
    #[serde(default)]
    pub derive_missing_gpa_histograms: bool,
    /// Filters applied when the caller does not supply its own.
    #[serde(default)]
    pub filters: FilterConfig,
}

fn default_pandemic_semesters() -> BTreeSet<SemesterId> {
    ["Spring 2020", "Summer 2020", "Fall 2020", "Spring 2021"]
        .into_iter()
        .map(SemesterId::from)
        .collect()
}

fn default_percentile_widths() -> Vec<f64> {
    DEFAULT_PERCENTILE_WIDTHS.to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pandemic_semesters: default_pandemic_semesters(),
            percentile_widths: default_percentile_widths(),
            derive_missing_gpa_histograms: false,
            filters: FilterConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.percentile_widths
            .iter()
            .try_for_each(|&w| validate_width(w))
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order when no path is given:
/// 1. `gradecurve.toml` in the current directory
/// 2. `~/.config/gradecurve/config.toml`
///
/// Environment variable override: `GRADECURVE_INCLUDE_PANDEMIC`.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("gradecurve.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded engine config from {}", path.display());
            config
        }
        None => EngineConfig::default(),
    };

    apply_env_override(&mut config, std::env::var("GRADECURVE_INCLUDE_PANDEMIC").ok())?;

    config.validate()?;
    Ok(config)
}

/// Apply a `GRADECURVE_INCLUDE_PANDEMIC` value to the default filters.
fn apply_env_override(
    config: &mut EngineConfig,
    include_pandemic: Option<String>,
) -> Result<()> {
    if let Some(value) = include_pandemic {
        config.filters.include_pandemic_semesters = value
            .trim()
            .parse()
            .with_context(|| {
                format!("GRADECURVE_INCLUDE_PANDEMIC must be true or false, got '{value}'")
            })?;
    }
    Ok(())
}

/// Parse a TOML string into an `EngineConfig`.
pub fn parse_config_str(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradecurve"))
}
