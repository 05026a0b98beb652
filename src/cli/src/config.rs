//! Analyzer configuration loading and validation

use accessgraph_entitlements::{IngestOptions, Strictness, ToxicCombo, ToxicPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete analyzer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub ingest: IngestSection,

    /// Toxic combinations, evaluated in this order
    #[serde(default = "default_toxic_combos")]
    pub toxic_combos: Vec<ToxicCombo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IngestSection {
    #[serde(default)]
    pub strictness: Strictness,

    /// Strip surrounding whitespace from CSV fields
    #[serde(default)]
    pub trim_whitespace: bool,
}

impl IngestSection {
    pub fn options(&self) -> IngestOptions {
        IngestOptions::new(self.strictness).with_trim_whitespace(self.trim_whitespace)
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSection::default(),
            ingest: IngestSection::default(),
            toxic_combos: default_toxic_combos(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_toxic_combos() -> Vec<ToxicCombo> { ToxicPolicy::financial_defaults().combos().to_vec() }

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AnalyzerConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configuration file {}", path.as_ref().display()))?;

        let config: AnalyzerConfig = toml::from_str(&contents)
            .context("Failed to parse configuration file")?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    ///
    /// Malformed toxic combinations are not fatal; [`ToxicPolicy::from_combos`]
    /// warns about and drops each one when the policy is built.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            anyhow::bail!(
                "Log level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        Ok(())
    }

    /// Build the immutable policy for this run
    pub fn policy(&self) -> ToxicPolicy {
        ToxicPolicy::from_combos(self.toxic_combos.iter().cloned())
    }
}
