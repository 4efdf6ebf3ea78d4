use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use log::{warn, error};
use snafu::{Snafu, ResultExt};

pub fn init_logging(default_filters: &str) {
    let log_env_raw = env::var("RUST_LOG");
    let log_env = log_env_raw.clone().ok()
        .filter(|env| !env.is_empty())
        .unwrap_or(default_filters.into());

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&log_env)
        .init();

    match &log_env_raw {
        Err(env::VarError::NotUnicode(..)) =>
            error!("Failed to read 'RUST_LOG' due to invalid Unicode. Using default instead: '{}'", default_filters),

        Err(env::VarError::NotPresent) =>
            warn!("Missing 'RUST_LOG'. Using default instead: '{}'", default_filters),

        Ok(s) if s.is_empty() =>
            warn!("Got empty 'RUST_LOG'. Using default instead: '{}'", default_filters),

        Ok(_) => (),
    }
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("'{}' missing or unset in '.env' file: {}", name, source))]
    BadVariable {
        name: String,
        source: env::VarError,
    },

    #[snafu(display("'{}' has an invalid value '{}': {}", name, value, reason))]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Reads prefixed environment variables, e.g. `COINFOLIO_PORT` for
/// `ConfigContext::new("COINFOLIO").var("PORT")`.
pub struct ConfigContext {
    prefix: String,
}

impl ConfigContext {
    pub fn new(prefix: impl AsRef<str>) -> ConfigContext {
        ConfigContext {
            prefix: prefix.as_ref().to_owned(),
        }
    }

    pub fn name_of(&self, name: impl AsRef<str>) -> String {
        format!("{}_{}", self.prefix, name.as_ref())
    }

    pub fn var(&self, name: impl AsRef<str>) -> Result<String, ConfigError> {
        env::var(self.name_of(name.as_ref()))
            .context(BadVariableSnafu { name: self.name_of(name.as_ref()) })
    }

    /// Unset and empty variables both fall back to `default`.
    pub fn var_or(&self, name: impl AsRef<str>, default: impl Into<String>) -> String {
        self.var(name)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.into())
    }

    pub fn parse_or<T>(&self, name: impl AsRef<str>, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = match self.var(name.as_ref()).ok().filter(|s| !s.trim().is_empty()) {
            None => return Ok(default),
            Some(x) => x,
        };

        raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            name: self.name_of(name.as_ref()),
            value: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Parses human durations such as `300s`, `10m` or `1h`.
    pub fn duration_or(&self, name: impl AsRef<str>, default: Duration) -> Result<Duration, ConfigError> {
        let raw = match self.var(name.as_ref()).ok().filter(|s| !s.trim().is_empty()) {
            None => return Ok(default),
            Some(x) => x,
        };

        parse_duration::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
            name: self.name_of(name.as_ref()),
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}
