//! Engine configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const FIXTURE_VAR: &str = "DOCGRAPH_FIXTURE";
pub const COMPOSITE_OR_VAR: &str = "DOCGRAPH_COMPOSITE_OR";
pub const FETCH_TIMEOUT_VAR: &str = "DOCGRAPH_FETCH_TIMEOUT_MS";
pub const ENTITY_TYPE_VAR: &str = "DOCGRAPH_TYPE";

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a boolean, got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be a positive integer of milliseconds, got '{value}'")]
    InvalidDuration { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// JSON fixture with definitions and documents to load.
    pub fixture_path: Option<PathBuf>,
    /// Whether the backend supports native composite OR filters.
    pub composite_or: bool,
    /// Upper bound on one top-level fetch, including nested resolution.
    pub fetch_timeout: Duration,
    /// Primary type to query; the first definition when unset.
    pub entity_type: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixture_path: None,
            composite_or: true,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            entity_type: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let defaults = Self::default();

        let composite_or = match get(COMPOSITE_OR_VAR) {
            None => defaults.composite_or,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        var: COMPOSITE_OR_VAR,
                        value,
                    })
                }
            },
        };

        let fetch_timeout = match get(FETCH_TIMEOUT_VAR) {
            None => defaults.fetch_timeout,
            Some(value) => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidDuration {
                        var: FETCH_TIMEOUT_VAR,
                        value,
                    })
                }
            },
        };

        Ok(Self {
            fixture_path: get(FIXTURE_VAR).map(PathBuf::from),
            composite_or,
            fetch_timeout,
            entity_type: get(ENTITY_TYPE_VAR),
        })
    }
}
