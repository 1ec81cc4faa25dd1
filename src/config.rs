//! YAML configuration for the fill command.
//!
//! ```yaml
//! default:
//!   rows: 20
//!   examples_per_table: 3
//! oracle:
//!   provider: ollama
//!   model: llama3.1
//! tables:
//!   department: { rows: 5 }
//!   employee: { rows: 50 }
//! ```
//!
//! When `tables` lists anything, only the listed tables are filled.

use crate::filler::{FillOptions, FillTargets, DEFAULT_EXAMPLE_LIMIT};
use ahash::AHashMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Row oracle backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    OpenAi,
    Fake,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            "fake" => Ok(Provider::Fake),
            _ => Err(format!(
                "Unknown provider: {}. Valid options: ollama, openai, fake",
                s
            )),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAi => write!(f, "openai"),
            Provider::Fake => write!(f, "fake"),
        }
    }
}

/// Per-table settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Target row count for this table (overrides default)
    pub rows: Option<u64>,
}

/// Default fill settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultConfig {
    /// Target row count for tables without their own setting
    pub rows: Option<u64>,
    /// Sample rows shown to the oracle per table
    pub examples_per_table: Option<usize>,
    /// Consecutive failed attempts before a table is abandoned
    pub max_consecutive_failures: Option<usize>,
}

/// Oracle backend settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub provider: Option<Provider>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Seed for the fake provider
    pub seed: Option<u64>,
}

/// Complete YAML configuration for the fill command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederConfig {
    pub default: DefaultConfig,
    pub oracle: OracleConfig,
    /// Per-table settings
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
}

impl SeederConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: SeederConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Get configuration for a specific table
    pub fn get_table_config(&self, table_name: &str) -> Option<&TableConfig> {
        self.tables.get(table_name).or_else(|| {
            let lower = table_name.to_lowercase();
            self.tables
                .iter()
                .find(|(k, _)| k.to_lowercase() == lower)
                .map(|(_, v)| v)
        })
    }

    /// Row targets: per table when `tables` is non-empty, otherwise uniform.
    ///
    /// `fallback_rows` applies when neither the table nor `default` sets rows.
    pub fn targets(&self, fallback_rows: u64) -> FillTargets {
        let default_rows = self.default.rows.unwrap_or(fallback_rows);
        if self.tables.is_empty() {
            return FillTargets::Uniform(default_rows);
        }

        let map: AHashMap<String, u64> = self
            .tables
            .iter()
            .map(|(name, config)| (name.clone(), config.rows.unwrap_or(default_rows)))
            .collect();
        FillTargets::PerTable(map)
    }

    /// Loop options from the `default` section
    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            example_limit: self
                .default
                .examples_per_table
                .unwrap_or(DEFAULT_EXAMPLE_LIMIT),
            max_consecutive_failures: self.default.max_consecutive_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_uniform() {
        let config = SeederConfig::from_yaml("{}").unwrap();
        assert_eq!(config.targets(5), FillTargets::Uniform(5));
        assert_eq!(config.fill_options(), FillOptions::default());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert!("gemini".parse::<Provider>().is_err());
    }
}
