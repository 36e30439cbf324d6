//! Configuration module
//!
//! Loads configuration from environment variables, falling back to defaults
//! for every setting.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Where sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Cookie = 0,
    Database = 1,
    Cache = 2,
}

impl FromStr for SessionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "cookie" => Ok(SessionBackend::Cookie),
            "1" | "database" => Ok(SessionBackend::Database),
            "2" | "cache" => Ok(SessionBackend::Cache),
            _ => Err(()),
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone)]
pub struct Options {
    pub templates: bool,
    pub sessions: bool,
    /// Request timeout in seconds, 0 disables it
    pub timeout: u64,
    pub log_requests: bool,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub name: String,
    pub dsn: String,
    pub key: String,
    /// Lifetime in hours
    pub duration: u32,
    pub backend: SessionBackend,
}

#[derive(Debug, Clone)]
pub struct Folders {
    pub public: PathBuf,
    pub resources: PathBuf,
    pub templates: PathBuf,
    pub tmp: PathBuf,
    pub data: PathBuf,
    pub migrations: PathBuf,
}

/// Default credentials for server-backed databases
#[derive(Debug, Clone)]
pub struct DbCredentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    pub debug: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Database file name, resolved against `folders.data` unless it starts with `.` or `/`
    pub database_name: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    pub options: Options,
    pub session: SessionConfig,
    pub folders: Folders,

    /// URL prefix the public folder is served under
    pub public_url: String,

    pub db: DbCredentials,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let path = |name: &str, default: &str| PathBuf::from(text(name, default));

        Ok(Self {
            host: text("HOST", "127.0.0.1"),
            port: parse(&lookup, "PORT", 4000)?,
            debug: parse_bool(&lookup, "DEBUG", true)?,
            log_json: parse_bool(&lookup, "LOG_JSON", false)?,
            database_name: text("DATABASE_NAME", "money.db"),
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            options: Options {
                templates: parse_bool(&lookup, "TEMPLATES", true)?,
                sessions: parse_bool(&lookup, "SESSIONS", false)?,
                timeout: parse(&lookup, "REQUEST_TIMEOUT_SECS", 0)?,
                log_requests: parse_bool(&lookup, "LOG_REQUESTS", true)?,
            },
            session: SessionConfig {
                name: text("SESSION_NAME", "session"),
                dsn: text("SESSION_DSN", ""),
                key: text("SESSION_KEY", ""),
                duration: parse(&lookup, "SESSION_DURATION_HOURS", 24)?,
                backend: parse(&lookup, "SESSION_BACKEND", SessionBackend::Cookie)?,
            },
            folders: Folders {
                public: path("PUBLIC_DIR", "./public"),
                resources: path("RESOURCES_DIR", "./ui"),
                templates: path("TEMPLATES_DIR", "./ui/templates"),
                tmp: path("TMP_DIR", "./tmp"),
                data: path("DATA_DIR", "./data"),
                migrations: path("MIGRATIONS_DIR", "./migrations"),
            },
            public_url: text("PUBLIC_URL", "/public"),
            db: DbCredentials {
                user: text("DB_USER", "sysdba"),
                password: text("DB_PASSWORD", "masterkey"),
                host: text("DB_HOST", "localhost"),
                port: parse(&lookup, "DB_PORT", 5432)?,
            },
        })
    }

    /// Address the server binds to
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::InvalidValue(name)),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr(), "127.0.0.1:4000");
        assert!(config.options.log_requests);
        assert_eq!(config.options.timeout, 0);
        assert_eq!(config.session.backend, SessionBackend::Cookie);
        assert_eq!(config.folders.data, PathBuf::from("./data"));
        assert_eq!(config.database_name, "money.db");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("REQUEST_TIMEOUT_SECS", "30"),
            ("LOG_REQUESTS", "false"),
            ("SESSION_BACKEND", "2"),
            ("DATA_DIR", "/var/lib/money"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.options.timeout, 30);
        assert!(!config.options.log_requests);
        assert_eq!(config.session.backend, SessionBackend::Cache);
        assert_eq!(config.folders.data, PathBuf::from("/var/lib/money"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue("PORT"))
        ));
        assert!(matches!(
            load(&[("SESSION_BACKEND", "7")]),
            Err(ConfigError::InvalidValue("SESSION_BACKEND"))
        ));
        assert!(matches!(
            load(&[("DEBUG", "maybe")]),
            Err(ConfigError::InvalidValue("DEBUG"))
        ));
    }
}
