use std::time::Duration;

use log::info;

use coinfolio_util::{ConfigContext, ConfigError};

pub const CONFIG_PREFIX: &str = "COINFOLIO";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub coingecko_url: String,
    pub cache_ttl: Duration,
    pub coin_cache_max_age: Duration,
    /// Zero disables the background refresh.
    pub refresh_interval: Duration,
    pub http_timeout: Duration,
    pub retry_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_context(&ConfigContext::new(CONFIG_PREFIX))
    }

    pub fn from_context(ctx: &ConfigContext) -> Result<Config, ConfigError> {
        let config = Config {
            host: ctx.var_or("HOST", "127.0.0.1"),
            port: ctx.parse_or("PORT", 5000u16)?,
            database_url: ctx.var_or("DATABASE_URL", "sqlite://coinfolio.db"),
            coingecko_url: ctx.var_or("COINGECKO_URL", "https://api.coingecko.com/api/v3/"),
            cache_ttl: ctx.duration_or("CACHE_TTL", Duration::from_secs(300))?,
            coin_cache_max_age: ctx.duration_or("COIN_CACHE_MAX_AGE", Duration::from_secs(60 * 60))?,
            refresh_interval: ctx.duration_or("REFRESH_INTERVAL", Duration::from_secs(10 * 60))?,
            http_timeout: ctx.duration_or("HTTP_TIMEOUT", Duration::from_secs(30))?,
            retry_attempts: ctx.parse_or("RETRY_ATTEMPTS", 3u32)?,
        };

        info!("Cache TTL: {:?}, coin cache max age: {:?}, refresh interval: {:?}",
              config.cache_ttl, config.coin_cache_max_age, config.refresh_interval);
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_context(&ConfigContext::new("COINFOLIO_API_TEST_DEFAULTS")).unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.coin_cache_max_age, Duration::from_secs(3600));
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn overrides_are_parsed() {
        env::set_var("COINFOLIO_API_TEST_SET_PORT", "8080");
        env::set_var("COINFOLIO_API_TEST_SET_REFRESH_INTERVAL", "0s");
        env::set_var("COINFOLIO_API_TEST_SET_CACHE_TTL", "1m");

        let config = Config::from_context(&ConfigContext::new("COINFOLIO_API_TEST_SET")).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh_interval, Duration::from_secs(0));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn invalid_port_is_an_error() {
        env::set_var("COINFOLIO_API_TEST_BAD_PORT", "not-a-port");
        assert!(Config::from_context(&ConfigContext::new("COINFOLIO_API_TEST_BAD")).is_err());
    }
}
