//! Layered configuration for okane.
//!
//! Sources are merged lowest precedence first:
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory, if present,
//! 3. an explicitly requested file (toml, yaml or json, chosen by extension),
//! 4. environment variables prefixed with `OKANE_`, using `__` to separate
//!    nested keys (e.g. `OKANE_DATABASE__MAX_CONNECTIONS=2`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "OKANE_";
const DATABASE_FILENAME: &str = "okane.sqlite3";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 1500;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "okanechan", "okane")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Keep everything in memory; `path` is ignored. Mostly for tests.
    pub in_memory: bool,
    pub path: PathBuf,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = match project_dirs() {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILENAME),
            // No home directory (some CI containers); fall back to the working directory.
            None => PathBuf::from(DATABASE_FILENAME),
        };
        Self {
            in_memory: false,
            path,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}
impl DatabaseConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            max_connections: 1,
            ..Self::default()
        }
    }

    /// Configuration for a database file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn location(&self) -> Location<'_> {
        match self.in_memory {
            true => Location::Memory,
            false => Location::File(&self.path),
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location<'a> {
    Memory,
    File(&'a Path),
}

impl Config {
    /// Load configuration from every layer (see crate docs).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user = project_dirs().map(|dirs| dirs.config_dir().join("config.toml"));
        Self::load_layers(user.as_deref(), explicit, true)
    }

    #[instrument(level = "debug")]
    fn load_layers(user: Option<&Path>, explicit: Option<&Path>, env: bool) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = user {
            // Missing user files are silently skipped by the provider.
            figment = figment.merge(Toml::file(user));
        }
        if let Some(explicit) = explicit {
            figment = Self::merge_file(figment, explicit)?;
        }
        if env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
        if !path.is_file() {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "merging configuration file");
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        Ok(match extension.as_deref() {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("database.max_connections must be at least 1"));
        }
        if !self.database.in_memory && self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_layers(None, None, false).unwrap();
        assert!(!config.database.in_memory);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.busy_timeout_ms, 1500);
        assert!(config.database.path.ends_with("okane.sqlite3"));
    }

    #[rstest]
    #[case(".toml", "[database]\nmax_connections = 2\npath = \"/tmp/expenses.db\"\n")]
    #[case(".yaml", "database:\n  max_connections: 2\n  path: /tmp/expenses.db\n")]
    #[case(".yml", "database:\n  max_connections: 2\n  path: /tmp/expenses.db\n")]
    #[case(".json", r#"{"database": {"max_connections": 2, "path": "/tmp/expenses.db"}}"#)]
    fn test_explicit_file_overrides_defaults(#[case] suffix: &str, #[case] contents: &str) {
        let file = write_config(suffix, contents);
        let config = Config::load_layers(None, Some(file.path()), false).unwrap();
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.path, PathBuf::from("/tmp/expenses.db"));
        // Untouched keys keep their defaults.
        assert_eq!(config.database.busy_timeout_ms, 1500);
    }

    #[test]
    fn test_explicit_file_wins_over_user_file() {
        let user = write_config(".toml", "[database]\nmax_connections = 3\nbusy_timeout_ms = 10\n");
        let explicit = write_config(".toml", "[database]\nmax_connections = 4\n");
        let config = Config::load_layers(Some(user.path()), Some(explicit.path()), false).unwrap();
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.busy_timeout_ms, 10);
    }

    #[test]
    fn test_missing_user_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_layers(Some(&dir.path().join("config.toml")), None, false).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_layers(None, Some(&dir.path().join("nope.toml")), false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let file = write_config(".ini", "max_connections=2");
        let err = Config::load_layers(None, Some(file.path()), false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config(".toml", "[database]\nmax_connections = \"many\"\n");
        let err = Config::load_layers(None, Some(file.path()), false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_zero_connections_is_invalid() {
        let file = write_config(".toml", "[database]\nmax_connections = 0\n");
        let err = Config::load_layers(None, Some(file.path()), false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_location() {
        assert_eq!(DatabaseConfig::in_memory().location(), Location::Memory);
        let config = DatabaseConfig::file("/tmp/expenses.db");
        assert_eq!(config.location(), Location::File(Path::new("/tmp/expenses.db")));
    }
}
