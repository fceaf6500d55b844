//! Configuration file handling.
//!
//! Settings live in `jobboard.toml`; every section is optional and falls back
//! to its defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::timeline::MonthKeying;

pub const DEFAULT_CONFIG_FILE: &str = "jobboard.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub monthly: MonthlyConfig,
}

/// REST backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Bearer token sent with every request, if set.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows shown in the employer's recent applications table.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_recent_limit() -> usize {
    5
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyConfig {
    /// Key postings by year and month instead of month of year alone.
    #[serde(default)]
    pub include_year: bool,
}

impl MonthlyConfig {
    pub fn keying(&self) -> MonthKeying {
        if self.include_year {
            MonthKeying::CalendarMonth
        } else {
            MonthKeying::MonthOfYear
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `path` when given, otherwise `jobboard.toml` in the working
    /// directory if present, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_toml() -> String {
        r#"# jobboard-insights configuration

[api]
base_url = "http://localhost:5000/api/v1"
timeout_seconds = 30
# token = "..."

[dashboard]
recent_limit = 5

[monthly]
# true keys postings by year and month; false merges the same month across years
include_year = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_toml_round_trips_to_defaults() {
        let parsed: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: Config = toml::from_str("[monthly]\ninclude_year = true\n").unwrap();
        assert_eq!(parsed.monthly.keying(), MonthKeying::CalendarMonth);
        assert_eq!(parsed.dashboard.recent_limit, 5);
        assert_eq!(parsed.api.timeout_seconds, 30);
    }

    #[test]
    fn loads_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://jobs.example.com/api/v1\"").unwrap();

        let config = Config::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://jobs.example.com/api/v1");
        assert!(config.api.token.is_none());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = Config::load(Path::new("/nonexistent/jobboard.toml"));
        assert!(result.is_err());
    }
}
