use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::portfolio::{CompanyFilter, SortOrder};

pub const CONFIG_ENV: &str = "USAGE_DASHBOARD_CONFIG";
pub const DATA_ENV: &str = "USAGE_DASHBOARD_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    pub data_path: Option<PathBuf>,
    pub sort: SortOrder,
    pub companies: Vec<String>,
    pub limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            sort: SortOrder::Usage,
            companies: Vec::new(),
            limit: 20,
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Explicit path, then `USAGE_DASHBOARD_CONFIG`, then defaults.
    /// `USAGE_DASHBOARD_DATA` fills `data_path` when the file leaves it unset.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                log::debug!("Reading dashboard config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        if config.data_path.is_none() {
            config.data_path = std::env::var_os(DATA_ENV).map(PathBuf::from);
        }

        Ok(config)
    }

    pub fn company_filter(&self) -> CompanyFilter {
        CompanyFilter::only(self.companies.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = DashboardConfig::from_json(r#"{"sort": "alpha-desc"}"#).unwrap();
        assert_eq!(config.sort, SortOrder::AlphaDesc);
        assert_eq!(config.limit, 20);
        assert!(config.companies.is_empty());
        assert!(config.company_filter().is_empty());
    }

    #[test]
    fn full_file_overrides_everything() {
        let config = DashboardConfig::from_json(
            r#"{"dataPath": "exports/usage.csv", "sort": "usage", "companies": ["VIOP"], "limit": 5}"#,
        )
        .unwrap();
        assert_eq!(config.data_path, Some(PathBuf::from("exports/usage.csv")));
        assert_eq!(config.limit, 5);
        assert!(config.company_filter().matches("VIOP"));
        assert!(!config.company_filter().matches("UNESUL"));
    }

    #[test]
    fn unknown_sort_is_rejected() {
        assert!(DashboardConfig::from_json(r#"{"sort": "random"}"#).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/dashboard.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dashboard.json"));
    }
}
