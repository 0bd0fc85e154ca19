//! Storage configuration shared by FFI and CLI front ends.
//!
//! # Invariants
//! - `user_key` matches `[A-Za-z0-9_.-]{1,64}` so derived storage keys stay
//!   opaque and collision-free.
//! - `db_path` is never empty.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Prefix of every per-user habit array key.
pub const STORAGE_KEY_PREFIX: &str = "lifehub.habits.";
/// User key used when the caller does not provide one.
pub const DEFAULT_USER_KEY: &str = "default";
/// Database file name used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "lifehub.sqlite3";
/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "LIFEHUB_DB_PATH";
/// Environment variable overriding the user key.
pub const USER_KEY_ENV: &str = "LIFEHUB_USER_KEY";

static USER_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,64}$").expect("valid user key regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyDbPath,
    InvalidUserKey(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDbPath => write!(f, "db_path cannot be empty"),
            Self::InvalidUserKey(value) => write!(
                f,
                "invalid user key `{value}`; expected 1-64 chars of [A-Za-z0-9_.-]"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Where habit data lives and whose array to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_path: PathBuf,
    pub user_key: String,
}

impl StorageConfig {
    /// Validates and builds a storage configuration.
    pub fn new(db_path: impl Into<PathBuf>, user_key: &str) -> Result<Self, ConfigError> {
        let db_path = db_path.into();
        if db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        let user_key = normalize_user_key(user_key)?;
        Ok(Self { db_path, user_key })
    }

    /// Builds configuration from `LIFEHUB_DB_PATH` / `LIFEHUB_USER_KEY`.
    ///
    /// Falls back to a database in the temp directory and the default user.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(None, None)
    }

    /// Builds configuration from explicit values, consulting the environment
    /// only for the ones not given.
    pub fn resolve(db_path: Option<PathBuf>, user_key: Option<String>) -> Result<Self, ConfigError> {
        let db_path = db_path.unwrap_or_else(|| {
            std::env::var(DB_PATH_ENV)
                .ok()
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME), PathBuf::from)
        });
        let user_key = user_key.unwrap_or_else(|| {
            std::env::var(USER_KEY_ENV).unwrap_or_else(|_| DEFAULT_USER_KEY.to_string())
        });
        Self::new(db_path, &user_key)
    }

    /// Opaque key of this user's habit array.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.user_key)
    }
}

/// Derives the storage key for one user.
pub fn storage_key_for(user_key: &str) -> Result<String, ConfigError> {
    Ok(format!("{STORAGE_KEY_PREFIX}{}", normalize_user_key(user_key)?))
}

fn normalize_user_key(user_key: &str) -> Result<String, ConfigError> {
    let trimmed = user_key.trim();
    if !USER_KEY_RE.is_match(trimmed) {
        return Err(ConfigError::InvalidUserKey(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
