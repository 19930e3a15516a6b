//! Configuration loading.
//!
//! # Responsibility
//! - Load the TOML configuration file with an environment-variable
//!   overlay and expose it as typed sections.
//! - Build the connection pool described by the `[database.*]` sections.
//!
//! # Invariants
//! - Configuration is read once at construction time; nothing in the core
//!   mutates it afterwards.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::db::{ConnectionPool, DbDriver, DbError, Dialect, SqliteExecutor};

const ENV_PREFIX: &str = "SHOPLITE_";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Figment(figment::Error),
    /// The named connection needs an executor the core does not ship;
    /// the boundary layer must inject one through `ConnectionPool::add`.
    ExternalDriver {
        name: String,
        driver: String,
    },
    UnknownDriver {
        name: String,
        driver: String,
    },
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "{err}"),
            Self::ExternalDriver { name, driver } => write!(
                f,
                "database connection `{name}` uses driver `{driver}`, which requires an injected executor"
            ),
            Self::UnknownDriver { name, driver } => {
                write!(f, "database connection `{name}` uses unknown driver `{driver}`")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(value)
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: BTreeMap<String, DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

fn default_level() -> String {
    crate::logging::default_log_level().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite` (embedded), `mysql` or `postgres` (executor injected by
    /// the boundary layer).
    pub driver: String,
    /// SQLite database file; absent or `:memory:` opens in memory.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl AppConfig {
    /// Loads the file and applies `SHOPLITE_*` environment overrides
    /// (`__` separates section from key).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let config = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Builds the pool for every configured connection the core can open
    /// itself.
    pub fn build_pool(&self) -> ConfigResult<ConnectionPool> {
        let mut pool = ConnectionPool::new();
        for (name, section) in &self.database {
            let driver = match section.driver.as_str() {
                "sqlite" => {
                    let executor = match section.path.as_deref() {
                        Some(path) if path != ":memory:" => SqliteExecutor::open(path)?,
                        _ => SqliteExecutor::open_in_memory()?,
                    };
                    DbDriver::new(Box::new(executor), Dialect::Sqlite)
                }
                "mysql" | "postgres" => {
                    return Err(ConfigError::ExternalDriver {
                        name: name.clone(),
                        driver: section.driver.clone(),
                    })
                }
                other => {
                    return Err(ConfigError::UnknownDriver {
                        name: name.clone(),
                        driver: other.to_string(),
                    })
                }
            };
            pool.add(name.clone(), driver, section.default);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp config file should be creatable");
        file.write_all(contents.as_bytes())
            .expect("temp config file should be writable");
        file
    }

    #[test]
    fn loads_sections_and_builds_the_default_pool() {
        let file = write_config(
            r#"
[logging]
level = "warn"

[database.main]
driver = "sqlite"
default = true
"#,
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.database.len(), 1);
        assert!(config.database["main"].default);

        let pool = config.build_pool().unwrap();
        assert!(pool.get("").is_ok());
        assert!(pool.get("main").is_ok());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let file = write_config("");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, super::default_level());
        assert!(config.database.is_empty());
    }

    #[test]
    fn external_drivers_are_reported_not_silently_skipped() {
        let file = write_config(
            r#"
[database.analytics]
driver = "postgres"
"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert!(matches!(
            config.build_pool(),
            Err(super::ConfigError::ExternalDriver { .. })
        ));
    }
}
