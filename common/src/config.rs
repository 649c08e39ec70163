use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yml::Error,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommonConfig {
    pub project_name: String,
    pub database_url: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            project_name: "relquery".to_string(),
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

/// How `every` treats a parent that has no related rows at all.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EveryPolicy {
    /// A parent with zero related rows satisfies `every` for any predicate.
    Vacuous,
    /// A parent must have at least one related row to satisfy `every`.
    #[default]
    RequireNonEmpty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub every_policy: EveryPolicy,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub schema_path: Option<String>,
}

fn default_max_depth() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            every_policy: EveryPolicy::default(),
            max_depth: default_max_depth(),
            log_level: default_log_level(),
            schema_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub translator: TranslatorConfig,
}

impl Config {
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = config_path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "parsed configuration");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        serde_yml::from_str(contents)
    }

    /// `DATABASE_URL` from the environment wins over the configured URL.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.common.database_url = url;
            }
        }
        self
    }
}
