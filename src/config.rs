use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";
pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
pub const DATASET_ENV: &str = "DASHBOARD_DATASET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Dashboard settings, read from `dashboard.json` when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Source workbook.
    pub dataset_path: PathBuf,
    /// Explicit indicator columns; `None` takes every non-budget column.
    pub indicator_columns: Option<Vec<String>>,
    /// Unit shown next to budget amounts.
    pub currency_label: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            dataset_path: PathBuf::from("FINAL_WITH_ALL_INDICATEURS.xlsx"),
            indicator_columns: None,
            currency_label: "millions de CDF".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve the effective configuration.
    ///
    /// Precedence, lowest first: defaults, the config file (`$DASHBOARD_CONFIG`
    /// or `./dashboard.json` if it exists), `$DASHBOARD_DATASET`, then the
    /// positional command-line path.
    pub fn resolve(
        config_env: Option<String>,
        dataset_env: Option<String>,
        cli_dataset: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_env {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(path) = dataset_env.filter(|p| !p.is_empty()) {
            config.dataset_path = PathBuf::from(path);
        }
        if let Some(path) = cli_dataset {
            config.dataset_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// [`resolve`](Self::resolve) from the process environment and arguments.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var(CONFIG_ENV).ok(),
            std::env::var(DATASET_ENV).ok(),
            std::env::args().nth(1),
        )
    }
}
