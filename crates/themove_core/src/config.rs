//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Resolve store location, logging, viewer identity and store
//!   capabilities from environment variables or a JSON file.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Malformed values are rejected with the offending key, never ignored.

use crate::logging::default_log_level;
use crate::model::actor::{Actor, ActorId};
use crate::repo::move_repo::{HostMarking, StoreCapabilities};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "THEMOVE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "THEMOVE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "THEMOVE_LOG_DIR";
pub const ENV_ACTOR_ID: &str = "THEMOVE_ACTOR_ID";
pub const ENV_ACTOR_NAME: &str = "THEMOVE_ACTOR_NAME";
pub const ENV_ALLOW_DELETE: &str = "THEMOVE_ALLOW_DELETE";
pub const ENV_HOST_MARKING: &str = "THEMOVE_HOST_MARKING";

const DEFAULT_DB_FILE_NAME: &str = "themove.sqlite3";
const DEFAULT_ACTOR_ID: &str = "you";
const DEFAULT_ACTOR_NAME: &str = "You";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "config io failed for `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "config parse failed for `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Host-facing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; `None` means `<temp>/themove.sqlite3`.
    pub db_path: Option<PathBuf>,
    /// `None` means the build-mode default.
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub actor_id: String,
    pub actor_name: String,
    pub allow_delete: bool,
    pub host_marking: HostMarking,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: None,
            log_dir: None,
            actor_id: DEFAULT_ACTOR_ID.to_string(),
            actor_name: DEFAULT_ACTOR_NAME.to_string(),
            allow_delete: false,
            host_marking: HostMarking::Creator,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, applying defaults for gaps.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        config.db_path = read(ENV_DB_PATH).map(PathBuf::from);
        config.log_level = read(ENV_LOG_LEVEL);
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(actor_id) = read(ENV_ACTOR_ID) {
            config.actor_id = actor_id;
        }
        if let Some(actor_name) = read(ENV_ACTOR_NAME) {
            config.actor_name = actor_name;
        }
        if let Some(raw) = read(ENV_ALLOW_DELETE) {
            config.allow_delete = parse_flag(ENV_ALLOW_DELETE, &raw)?;
        }
        if let Some(raw) = read(ENV_HOST_MARKING) {
            config.host_marking = parse_host_marking(&raw)?;
        }
        Ok(config)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents).map_err(io_error)
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    pub fn viewer(&self) -> Result<Actor, ConfigError> {
        let id = ActorId::parse(&self.actor_id).ok_or_else(|| ConfigError::InvalidValue {
            key: ENV_ACTOR_ID,
            value: self.actor_id.clone(),
        })?;
        Ok(Actor::new(id, self.actor_name.as_str()))
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            supports_delete: self.allow_delete,
            host_marking: self.host_marking,
        }
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_host_marking(raw: &str) -> Result<HostMarking, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "creator" => Ok(HostMarking::Creator),
        "everyone" => Ok(HostMarking::Everyone),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_HOST_MARKING,
            value: raw.to_string(),
        }),
    }
}
