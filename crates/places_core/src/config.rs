//! Core configuration.
//!
//! # Responsibility
//! - Describe remote endpoints, user-facing messages and logging options.
//! - Load them from JSON with every field optional.
//!
//! # Invariants
//! - A missing field always falls back to the built-in default.

use crate::remote::gateway::DEFAULT_BASE_URL;
use crate::remote::Endpoints;
use crate::store::StoreMessages;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.base_url.as_str())
    }
}

/// File logging options. `level: None` means the build-mode default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub endpoints: EndpointConfig,
    pub messages: StoreMessages,
    pub logging: LogConfig,
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::store::StoreMessages;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(
            config.endpoints.endpoints().user_places().as_str(),
            "http://localhost:3000/user-places"
        );
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let config = CoreConfig::from_json_str(
            r#"{
                "endpoints": { "base_url": "https://places.example" },
                "messages": { "add_failed": "Could not save." },
                "logging": { "level": "warn" }
            }"#,
        )
        .expect("partial config");

        assert_eq!(
            config.endpoints.endpoints().available_places().as_str(),
            "https://places.example/places"
        );
        assert_eq!(config.messages.add_failed, "Could not save.");
        assert_eq!(config.messages.remove_failed, StoreMessages::default().remove_failed);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.logging.dir, None);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CoreConfig::from_json_str("{ nope").expect_err("malformed");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CoreConfig::from_file("/nonexistent/places.json").expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/places.json"));
    }
}
