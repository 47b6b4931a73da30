use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::data::clean::EmptyColumnPolicy;

pub const DATASET_ENV: &str = "NUTRITION_DATASET";
pub const PIPELINE_ENV: &str = "NUTRITION_PIPELINE";
pub const PROTECTED_COLUMNS_ENV: &str = "NUTRITION_PROTECTED_COLUMNS";
pub const EMPTY_COLUMN_POLICY_ENV: &str = "NUTRITION_EMPTY_COLUMN_POLICY";

const DEFAULT_PROTECTED_COLUMNS: [&str; 3] = ["unnamed_0", "name", "serving_size"];

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Startup configuration.  Defaults can be overridden with `NUTRITION_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Nutrition table (`.csv`, `.json` or `.parquet`).
    pub dataset_path: PathBuf,
    /// Pre-trained pipeline bundle (`.json`).
    pub pipeline_path: PathBuf,
    /// Columns excluded from cleaning.
    pub protected_columns: BTreeSet<String>,
    pub empty_column_policy: EmptyColumnPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("nutrition.csv"),
            pipeline_path: PathBuf::from("pipeline.json"),
            protected_columns: DEFAULT_PROTECTED_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            empty_column_policy: EmptyColumnPolicy::Fail,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DATASET_ENV).filter(|v| !v.trim().is_empty()) {
            config.dataset_path = PathBuf::from(path.trim());
        }
        if let Some(path) = lookup(PIPELINE_ENV).filter(|v| !v.trim().is_empty()) {
            config.pipeline_path = PathBuf::from(path.trim());
        }
        if let Some(list) = lookup(PROTECTED_COLUMNS_ENV) {
            config.protected_columns = list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(policy) = lookup(EMPTY_COLUMN_POLICY_ENV) {
            config.empty_column_policy = policy
                .parse()
                .map_err(|e| anyhow!("{EMPTY_COLUMN_POLICY_ENV}: {e}"))?;
        }

        log::debug!("Configuration: {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.protected_columns.contains("serving_size"));
        assert_eq!(config.empty_column_policy, EmptyColumnPolicy::Fail);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATASET_ENV, "/data/foods.parquet"),
            (PIPELINE_ENV, " model.json "),
            (PROTECTED_COLUMNS_ENV, "id, name ,serving_size,"),
            (EMPTY_COLUMN_POLICY_ENV, "fill:0"),
        ]))
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/data/foods.parquet"));
        assert_eq!(config.pipeline_path, PathBuf::from("model.json"));
        assert_eq!(
            config.protected_columns.iter().cloned().collect::<Vec<_>>(),
            vec!["id", "name", "serving_size"]
        );
        assert_eq!(config.empty_column_policy, EmptyColumnPolicy::Fill(0.0));
    }

    #[test]
    fn test_invalid_policy_is_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(EMPTY_COLUMN_POLICY_ENV, "skip")]))
            .unwrap_err();
        assert!(err.to_string().contains(EMPTY_COLUMN_POLICY_ENV));
    }
}
