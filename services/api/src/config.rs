//! Service configuration
//!
//! Values come from defaults overridden by `VIDEO_API_*` environment
//! variables, e.g. `VIDEO_API_PORT=8080` or `VIDEO_API_STORE=memory`.
//! Database settings are read separately by `common::database`.

use std::time::Duration;

use anyhow::{Result, anyhow};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::rate_limiter::RateLimiterConfig;

/// Prefix of every environment variable read by [`ApiConfig::from_env`]
pub const ENV_PREFIX: &str = "VIDEO_API";

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// `development` allows any CORS origin
    pub environment: String,
    pub store: StoreBackend,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Comma-separated allowed CORS origins outside development
    pub cors_origins: String,
    /// Requests allowed per client and window; 0 disables rate limiting
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3001)?
            .set_default("environment", "development")?
            .set_default("store", "postgres")?
            .set_default("log_level", "info")?
            .set_default("cors_origins", "")?
            .set_default("rate_limit_max", 100)?
            .set_default("rate_limit_window_secs", 15 * 60)?
            .add_source(environment)
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.rate_limit_max > 0 && self.rate_limit_window_secs == 0 {
            return Err(anyhow!("Rate limit window must be greater than 0"));
        }

        if !self.is_development() && self.allowed_origins().is_empty() {
            return Err(anyhow!(
                "{}_CORS_ORIGINS is required outside development",
                ENV_PREFIX
            ));
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn rate_limiter_config(&self) -> Option<RateLimiterConfig> {
        (self.rate_limit_max > 0).then(|| RateLimiterConfig {
            max_requests: self.rate_limit_max,
            window: Duration::from_secs(self.rate_limit_window_secs),
        })
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let mut source = config::Map::new();
        for (key, value) in vars {
            source.insert(key.to_string(), value.to_string());
        }
        ApiConfig::load(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(source)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
        assert_eq!(config.store, StoreBackend::Postgres);
        assert_eq!(config.log_level, "info");
        assert!(config.is_development());
        assert!(config.allowed_origins().is_empty());
        assert_eq!(
            config.rate_limiter_config(),
            Some(RateLimiterConfig {
                max_requests: 100,
                window: Duration::from_secs(900),
            })
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides() {
        let config = load(&[
            ("VIDEO_API_PORT", "8080"),
            ("VIDEO_API_STORE", "memory"),
            ("VIDEO_API_ENVIRONMENT", "production"),
            (
                "VIDEO_API_CORS_ORIGINS",
                "https://videos.example.com, https://admin.example.com",
            ),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(!config.is_development());
        assert_eq!(
            config.allowed_origins(),
            vec!["https://videos.example.com", "https://admin.example.com"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_origins() {
        let config = load(&[("VIDEO_API_ENVIRONMENT", "production")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_settings() {
        let config = load(&[
            ("VIDEO_API_RATE_LIMIT_MAX", "10"),
            ("VIDEO_API_RATE_LIMIT_WINDOW_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(
            config.rate_limiter_config(),
            Some(RateLimiterConfig {
                max_requests: 10,
                window: Duration::from_secs(60),
            })
        );

        let disabled = load(&[("VIDEO_API_RATE_LIMIT_MAX", "0")]).unwrap();
        assert_eq!(disabled.rate_limiter_config(), None);

        let broken = load(&[("VIDEO_API_RATE_LIMIT_WINDOW_SECS", "0")]).unwrap();
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        assert!(load(&[("VIDEO_API_STORE", "mongodb")]).is_err());
    }
}
