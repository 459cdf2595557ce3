use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::ReconcileOptions;
use crate::domain::AccessionPattern;
use crate::ena::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::error::ResolverError;
use crate::member::DEFAULT_ALIAS_PREFIX;
use crate::project::DEFAULT_SAMPLE_DB;

pub const CONFIG_FILE_NAME: &str = "ena-rr.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub alias_prefix: Option<String>,
    #[serde(default)]
    pub sample_db: Option<String>,
    #[serde(default)]
    pub sample_prefix: Option<String>,
    #[serde(default)]
    pub sample_width: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub base_url: String,
    pub timeout: Duration,
    pub options: ReconcileOptions,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` if given; otherwise `ena-rr.json` in the current
    /// directory, then the user config directory, then built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ResolverError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_paths().into_iter().find(|path| path.exists()),
        };

        let Some(config_path) = config_path else {
            debug!("no config file found, using defaults");
            return Self::resolve_config(Config::default());
        };

        debug!(path = %config_path.display(), "loading config");
        let content = fs::read_to_string(&config_path)
            .map_err(|_| ResolverError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ResolverError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dirs) = ProjectDirs::from("org", "ena-rr", "ena-rr") {
            paths.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }
        paths
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ResolverError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let default_pattern = AccessionPattern::default();
        let sample_pattern = AccessionPattern::new(
            config.sample_prefix.unwrap_or(default_pattern.prefix),
            config.sample_width.unwrap_or(default_pattern.width),
        );
        sample_pattern.validate()?;
        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ResolverError::InvalidConfig(
                "timeout_secs must be positive".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            options: ReconcileOptions {
                alias_prefix: config
                    .alias_prefix
                    .unwrap_or_else(|| DEFAULT_ALIAS_PREFIX.to_string()),
                sample_db: config
                    .sample_db
                    .unwrap_or_else(|| DEFAULT_SAMPLE_DB.to_string()),
                sample_pattern,
            },
        })
    }
}
