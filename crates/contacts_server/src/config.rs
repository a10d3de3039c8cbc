//! Process configuration read from the environment.
//!
//! | Variable       | Default                         |
//! |----------------|---------------------------------|
//! | `DATABASE_URI` | required (`:memory:` or a dir)  |
//! | `DB_NAME`      | `contactsdb`                    |
//! | `PORT`         | `3000`                          |
//! | `PUBLIC_DIR`   | `public`                        |
//! | `LOG_LEVEL`    | `debug` (debug) / `info` (release) |
//! | `LOG_DIR`      | unset: log to stderr            |

use contacts_core::{default_log_level, StoreConfig};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_NAME: &str = "contactsdb";
pub const DEFAULT_PUBLIC_DIR: &str = "public";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub public_dir: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "environment variable {key} is required"),
            Self::Invalid { key, value, reason } => {
                write!(f, "invalid {key} value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let address = var("DATABASE_URI").ok_or(ConfigError::Missing("DATABASE_URI"))?;
        let database = var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());

        Ok(Self {
            port: try_parse("PORT", var("PORT"), DEFAULT_PORT)?,
            store: StoreConfig::new(address, database),
            public_dir: var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_DIR)),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_dir: var("LOG_DIR"),
        })
    }
}

fn try_parse<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(ConfigError::Invalid {
                key,
                reason: err.to_string(),
                value,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, DEFAULT_DB_NAME, DEFAULT_PORT};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_address_is_set() {
        let config = load(&[("DATABASE_URI", ":memory:")]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.store.address, ":memory:");
        assert_eq!(config.store.database, DEFAULT_DB_NAME);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("DATABASE_URI", "/var/lib/contacts"),
            ("DB_NAME", "people"),
            ("PORT", "8080"),
            ("PUBLIC_DIR", "/srv/public"),
            ("LOG_LEVEL", "warn"),
            ("LOG_DIR", "/var/log/contacts"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store.database, "people");
        assert_eq!(config.public_dir, PathBuf::from("/srv/public"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/contacts"));
    }

    #[test]
    fn missing_or_blank_address_is_an_error() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URI"));
        assert_eq!(
            load(&[("DATABASE_URI", "  ")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URI")
        );
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = load(&[("DATABASE_URI", ":memory:"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }
}
