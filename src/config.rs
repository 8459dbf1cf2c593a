//! Configuration management for elskip_data
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables, then command-line flags. Every section is optional
//! in the file and falls back to its defaults field by field.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::index::IndexConfig;
use crate::app::lookup::LookupConfig;
use crate::app::pipeline::{GridPaths, TabularPaths};
use crate::app::tabular::TabularConfig;
use crate::constants::{env, paths};
use crate::errors::{ConfigError, ConfigResult};

/// File name searched for in the working directory
pub const LOCAL_CONFIG_FILE: &str = "elskip.toml";

/// Unified application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Input and output locations
    pub paths: PathsConfig,
    /// Region lookup service
    pub lookup: LookupConfig,
    /// Index generation
    pub index: IndexConfig,
    /// Extract aggregation
    pub tabular: TabularConfig,
    pub logging: LoggingConfig,
}

/// Input and output locations
///
/// Unset entries are derived from `data_root` using the conventional layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_root: PathBuf,
    pub grid_dir: Option<PathBuf>,
    pub maru_dir: Option<PathBuf>,
    pub index_output: Option<PathBuf>,
    pub maru_output: Option<PathBuf>,
    /// Dashboard public directory receiving copies of the outputs
    pub dashboard_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(paths::DATA_ROOT),
            grid_dir: None,
            maru_dir: None,
            index_output: None,
            maru_output: None,
            dashboard_dir: Some(PathBuf::from(paths::DASHBOARD_PUBLIC_DIR)),
        }
    }
}

impl PathsConfig {
    pub fn grid_dir(&self) -> PathBuf {
        self.grid_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join(paths::GRID_DIR))
    }

    pub fn maru_dir(&self) -> PathBuf {
        self.maru_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join(paths::MARU_DIR))
    }

    pub fn index_output(&self) -> PathBuf {
        self.index_output
            .clone()
            .unwrap_or_else(|| self.data_root.join(paths::INDEX_FILE))
    }

    pub fn maru_output(&self) -> PathBuf {
        self.maru_output
            .clone()
            .unwrap_or_else(|| self.maru_dir().join(paths::MARU_OUTPUT_FILE))
    }

    /// Grid pipeline locations
    pub fn grid_paths(&self) -> GridPaths {
        GridPaths {
            grid_dir: self.grid_dir(),
            index_output: self.index_output(),
            dashboard_dir: self.dashboard_dir.clone(),
        }
    }

    /// Tabular pipeline locations
    pub fn tabular_paths(&self) -> TabularPaths {
        TabularPaths {
            extract_dir: self.maru_dir(),
            output: self.maru_output(),
            dashboard_dir: self.dashboard_dir.clone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, `./elskip.toml`, or the user config directory)
    /// 3. Environment variables
    ///
    /// Command-line overrides are applied by the caller afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when an explicitly given file does not
    /// exist, and parse or validation errors for invalid content.
    pub async fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Per-user config file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("elskip").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Applies `ELSKIP_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = var(env::DATA_DIR).filter(|v| !v.is_empty()) {
            debug!("{} overrides data root: {}", env::DATA_DIR, dir);
            self.paths.data_root = PathBuf::from(dir);
        }
        if let Some(url) = var(env::LOOKUP_URL).filter(|v| !v.is_empty()) {
            debug!("{} overrides lookup URL: {}", env::LOOKUP_URL, url);
            self.lookup.base_url = url;
        }
    }

    /// Checks values that would make a run meaningless
    pub fn validate(&self) -> ConfigResult<()> {
        if self.lookup.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "lookup.request_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Request timeout must be greater than zero".to_string(),
            });
        }
        if self.lookup.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lookup.base_url".to_string(),
                value: self.lookup.base_url.clone(),
                reason: "Base URL must not be empty".to_string(),
            });
        }
        if self.tabular.unknown_region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tabular.unknown_region".to_string(),
                value: self.tabular.unknown_region.clone(),
                reason: "Label for records without region must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let config = AppConfig::default();
        assert_eq!(config.paths.grid_dir(), PathBuf::from("data/grid"));
        assert_eq!(config.paths.index_output(), PathBuf::from("data/grid_index.json"));
        assert_eq!(
            config.paths.maru_output(),
            PathBuf::from("data/maru/maru_dashboard_data.json")
        );
        assert_eq!(
            config.paths.dashboard_dir,
            Some(PathBuf::from("dashboard/public"))
        );
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("elskip.toml");
        std::fs::write(
            &path,
            r#"
[paths]
data_root = "/srv/elskip"
grid_dir = "/srv/grid"

[lookup]
request_timeout = "3s"
inter_call_delay = "100ms"

[tabular]
unknown_region = "Ukjent"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.paths.grid_dir(), PathBuf::from("/srv/grid"));
        assert_eq!(config.paths.maru_dir(), PathBuf::from("/srv/elskip/maru"));
        assert_eq!(config.lookup.request_timeout, Duration::from_secs(3));
        assert_eq!(config.lookup.inter_call_delay, Duration::from_millis(100));
        assert_eq!(config.lookup.user_agent, "ElektriskSkipsfart/1.0");
        assert_eq!(config.tabular.unknown_region, "Ukjent");
        assert_eq!(config.index, IndexConfig::default());
    }

    #[tokio::test]
    async fn test_explicit_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        let result = AppConfig::load(Some(missing.as_path())).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[lookup\nbase_url = ").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path).await,
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| match key {
            "ELSKIP_DATA_DIR" => Some("/tmp/elskip".to_string()),
            "ELSKIP_LOOKUP_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.paths.data_root, PathBuf::from("/tmp/elskip"));
        // Empty values are ignored
        assert_eq!(config.lookup.base_url, LookupConfig::default().base_url);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.lookup.request_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "lookup.request_timeout"
        ));

        let mut config = AppConfig::default();
        config.lookup.base_url = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.tabular.unknown_region = String::new();
        assert!(config.validate().is_err());
    }
}
