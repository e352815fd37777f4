// Configuration for prisk
// Read from an optional YAML file, then environment overrides, then validated.
// The resulting value is passed explicitly; there is no global instance.

use crate::advisor::{DEFAULT_FUNCTION_PATTERN, FunctionScanner};
use crate::impact::ImpactSettings;
use crate::indexer::test_detection::{DEFAULT_TEST_FILE_PREFIX, DEFAULT_TEST_NAME_PREFIX};
use crate::risk::RiskRules;
use crate::util;
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid function pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid risk rules: {0}")]
    InvalidRisk(String),
    #[error("invalid coverage settings: {0}")]
    InvalidCoverage(String),
}

/// Test naming conventions used by the context builder and the advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoverageSettings {
    /// Prepended to a file's base name to guess its test file.
    pub test_file_prefix: String,
    /// Functions starting with this are treated as tests.
    pub test_name_prefix: String,
    /// Regex whose first capture group is a function name.
    pub function_pattern: String,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            test_file_prefix: DEFAULT_TEST_FILE_PREFIX.to_string(),
            test_name_prefix: DEFAULT_TEST_NAME_PREFIX.to_string(),
            function_pattern: DEFAULT_FUNCTION_PATTERN.to_string(),
        }
    }
}

impl CoverageSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_name_prefix.is_empty() {
            return Err(ConfigError::InvalidCoverage(
                "test_name_prefix must not be empty".into(),
            ));
        }
        if self.test_file_prefix.is_empty() {
            return Err(ConfigError::InvalidCoverage(
                "test_file_prefix must not be empty".into(),
            ));
        }
        FunctionScanner::new(&self.function_pattern)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub impact: ImpactSettings,
    pub risk: RiskRules,
    pub coverage: CoverageSettings,
}

impl Config {
    /// Load from a YAML file, apply `PRISK_*` overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = util::read_to_string(path)?;
                Self::from_yaml_str(&raw)
                    .with_context(|| format!("parse config {}", path.display()))?
            }
            None => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml_ng::from_str(raw)?;
        Ok(config)
    }

    /// Apply environment overrides. Invalid values are reported and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "PRISK_MAX_SCORE", &mut self.risk.max_score);
        override_parsed(&lookup, "PRISK_TRANSITIVE", &mut self.impact.transitive);
        override_parsed(&lookup, "PRISK_IMPACT_DEPTH", &mut self.impact.max_depth);
        if let Some(val) = lookup("PRISK_TEST_PREFIX") {
            self.coverage.test_name_prefix = val;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.risk.validate()?;
        self.coverage.validate()?;
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    let Some(val) = lookup(key) else {
        return;
    };
    match val.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(
            key,
            value = %val,
            current = %slot,
            "invalid override, keeping current value"
        ),
    }
}
