//! Service configuration
//!
//! Read from a YAML file, then overridden field-by-field from `PGLEDGER_*`
//! environment variables. Every field has a default, so a partial (or
//! missing) file still yields a runnable configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pgledger_core::PgSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `PGLEDGER_POSTGRES_PASSWORD`
pub const ENV_PREFIX: &str = "PGLEDGER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Record store backend behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub loglevel: LogLevel,
    pub logformat: LogFormat,
    pub logtofile: bool,
    pub postgres_host: String,
    pub postgres_port: u16,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_db: String,
    pub migrations_path: PathBuf,
    /// Number of pooled client handles
    pub max_threads: usize,
    pub backend: Backend,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            loglevel: LogLevel::Info,
            logformat: LogFormat::Plain,
            logtofile: false,
            postgres_host: "localhost".into(),
            postgres_port: 5432,
            postgres_user: "root".into(),
            postgres_password: "secret".into(),
            postgres_db: "bank".into(),
            migrations_path: PathBuf::from("./migrations"),
            max_threads: 1,
            backend: Backend::Postgres,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load `path` and apply environment overrides.
    ///
    /// Returns the config and whether the defaults were used because the
    /// file was missing or empty.
    pub fn load(path: &Path) -> Result<(Self, bool), ConfigError> {
        let (mut config, defaults_used) = match std::fs::read_to_string(path) {
            Ok(raw) => (Self::from_yaml(&raw)?, raw.trim().is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Self::default(), true),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.sanitize();
        Ok((config, defaults_used))
    }

    /// Replace zero or empty values with their defaults.
    ///
    /// `max_threads` is left alone so that a zero pool size is still rejected
    /// when the pool is built.
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        if self.port == 0 {
            self.port = defaults.port;
        }
        if self.postgres_host.is_empty() {
            self.postgres_host = defaults.postgres_host;
        }
        if self.postgres_port == 0 {
            self.postgres_port = defaults.postgres_port;
        }
        if self.postgres_user.is_empty() {
            self.postgres_user = defaults.postgres_user;
        }
        if self.postgres_password.is_empty() {
            self.postgres_password = defaults.postgres_password;
        }
        if self.postgres_db.is_empty() {
            self.postgres_db = defaults.postgres_db;
        }
        if self.migrations_path.as_os_str().is_empty() {
            self.migrations_path = defaults.migrations_path;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
    }

    /// Apply `PGLEDGER_<FIELD>` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| {
            let key = format!("{ENV_PREFIX}{field}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = get("PORT") {
            self.port = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("LOGLEVEL") {
            self.loglevel = parse_with(&key, &value, LogLevel::from_str)?;
        }
        if let Some((key, value)) = get("LOGFORMAT") {
            self.logformat = parse_with(&key, &value, LogFormat::from_str)?;
        }
        if let Some((key, value)) = get("LOGTOFILE") {
            self.logtofile = parse(&key, &value)?;
        }
        if let Some((_, value)) = get("POSTGRES_HOST") {
            self.postgres_host = value;
        }
        if let Some((key, value)) = get("POSTGRES_PORT") {
            self.postgres_port = parse(&key, &value)?;
        }
        if let Some((_, value)) = get("POSTGRES_USER") {
            self.postgres_user = value;
        }
        if let Some((_, value)) = get("POSTGRES_PASSWORD") {
            self.postgres_password = value;
        }
        if let Some((_, value)) = get("POSTGRES_DB") {
            self.postgres_db = value;
        }
        if let Some((_, value)) = get("MIGRATIONS_PATH") {
            self.migrations_path = PathBuf::from(value);
        }
        if let Some((key, value)) = get("MAX_THREADS") {
            self.max_threads = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("BACKEND") {
            self.backend = parse_with(&key, &value, Backend::from_str)?;
        }
        if let Some((key, value)) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse(&key, &value)?;
        }
        Ok(())
    }

    /// Connection settings for the relational backend
    pub fn pg_settings(&self) -> PgSettings {
        PgSettings {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            user: self.postgres_user.clone(),
            password: self.postgres_password.clone(),
            database: self.postgres_db.clone(),
        }
    }

    /// Copy safe to print: the password is replaced by `***`.
    pub fn masked(&self) -> Self {
        Self {
            postgres_password: "***".into(),
            ..self.clone()
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    parse_with(key, value, T::from_str)
}

fn parse_with<T, E>(
    key: &str,
    value: &str,
    f: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    f(value.trim()).map_err(|_| ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = Config::from_yaml("port: 9090\npostgres_db: ledger\n").unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.postgres_db, "ledger");
        assert_eq!(config.postgres_host, "localhost");
        assert_eq!(config.max_threads, 1);
        assert_eq!(config.loglevel, LogLevel::Info);
        assert_eq!(config.backend, Backend::Postgres);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Config::from_yaml("loglevel: verbose\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_pool_size_passes_through() {
        let config = Config::from_yaml("max_threads: 0\n").unwrap();
        assert_eq!(config.max_threads, 0);
    }

    #[test]
    fn zero_and_empty_values_fall_back_to_defaults() {
        let mut config = Config::from_yaml(
            "port: 0\npostgres_host: ''\npostgres_port: 0\npostgres_db: ''\nmigrations_path: ''\nrequest_timeout_secs: 0\nmax_threads: 0\n",
        )
        .unwrap();
        config.sanitize();

        let defaults = Config::default();
        assert_eq!(config.port, defaults.port);
        assert_eq!(config.postgres_host, defaults.postgres_host);
        assert_eq!(config.postgres_port, defaults.postgres_port);
        assert_eq!(config.postgres_db, defaults.postgres_db);
        assert_eq!(config.migrations_path, defaults.migrations_path);
        assert_eq!(config.request_timeout_secs, defaults.request_timeout_secs);
        assert_eq!(config.max_threads, 0);
    }

    #[test]
    fn load_sanitizes_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 0\npostgres_user: ''\npostgres_db: ledger").unwrap();

        let (config, _) = Config::load(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.postgres_user, "root");
        assert_eq!(config.postgres_db, "ledger");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, defaults_used) = Config::load(&dir.path().join("absent.yml")).unwrap();
        assert!(defaults_used);
        assert_eq!(config.port, Config::default().port);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend: memory\nmax_threads: 4\nlogformat: json").unwrap();

        let (config, defaults_used) = Config::load(file.path()).unwrap();
        assert!(!defaults_used);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.max_threads, 4);
        assert_eq!(config.logformat, LogFormat::Json);
    }

    #[test]
    fn env_overrides_win() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("PGLEDGER_POSTGRES_PASSWORD", "hunter2"),
                ("PGLEDGER_PORT", "3000"),
                ("PGLEDGER_LOGLEVEL", "DEBUG"),
                ("PGLEDGER_BACKEND", "memory"),
            ]))
            .unwrap();

        assert_eq!(config.postgres_password, "hunter2");
        assert_eq!(config.port, 3000);
        assert_eq!(config.loglevel, LogLevel::Debug);
        assert_eq!(config.backend, Backend::Memory);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("PGLEDGER_MAX_THREADS", "many")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "PGLEDGER_MAX_THREADS");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn masked_yaml_hides_password() {
        let config = Config {
            postgres_password: "hunter2".into(),
            ..Config::default()
        };
        let yaml = config.masked().to_yaml().unwrap();
        assert!(!yaml.contains("hunter2"));
        assert!(yaml.contains("***"));
    }

    #[test]
    fn pg_settings_follow_config() {
        let settings = Config::default().pg_settings();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5432);
        assert_eq!(settings.database, "bank");
    }
}
