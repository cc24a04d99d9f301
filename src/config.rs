//! # Configuration
//!
//! Loaded via a layered [`config`] builder (optional file, then
//! `THROTTLER_*` environment overrides), falling back to
//! [`Config::default`] with a warning if deserialization fails outright.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ThrottlerResult;

/// Default token-bucket parameters for keys with no [`Config::custom_limits`]
/// entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BucketLimit {
    pub rate: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub bind_address: String,
    pub default_limit: BucketLimit,
    /// Per-key overrides, matched by substring against tiers embedded in
    /// the key (e.g. `"user:42:premium"` matches a `"premium"` entry).
    pub custom_limits: HashMap<String, BucketLimit>,
}

impl Default for Config {
    fn default() -> Self {
        let mut custom_limits = HashMap::new();
        custom_limits.insert(
            "premium".to_string(),
            BucketLimit {
                rate: 100.0,
                size: 200.0,
            },
        );
        custom_limits.insert(
            "basic".to_string(),
            BucketLimit {
                rate: 10.0,
                size: 20.0,
            },
        );

        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            bind_address: "127.0.0.1:8080".to_string(),
            default_limit: BucketLimit {
                rate: 50.0,
                size: 100.0,
            },
            custom_limits,
        }
    }
}

impl Config {
    /// Loads configuration from an optional file at `path`, then from
    /// `THROTTLER_*` environment variables, falling back to defaults if
    /// nothing parses.
    pub fn load(path: &str) -> ThrottlerResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("THROTTLER").separator("__"))
            .build()?;

        match settings.try_deserialize::<Config>() {
            Ok(config) => Ok(config),
            Err(_) => {
                tracing::warn!("failed to load config from {path}, using defaults");
                Ok(Config::default())
            }
        }
    }

    /// Resolves the `(rate, size)` a key should use: the first matching
    /// substring tier, or the default.
    pub fn limit_for_key(&self, key: &str) -> BucketLimit {
        for (tier, limit) in &self.custom_limits {
            if key.contains(tier.as_str()) {
                return *limit;
            }
        }
        self.default_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_limits() {
        let config = Config::default();
        assert!(config.default_limit.rate > 0.0);
        assert!(config.default_limit.size > 0.0);
    }

    #[test]
    fn tier_match_overrides_default() {
        let config = Config::default();
        let limit = config.limit_for_key("user:42:premium");
        assert_eq!(limit.rate, 100.0);
        assert_eq!(limit.size, 200.0);
    }

    #[test]
    fn unmatched_key_uses_default() {
        let config = Config::default();
        let limit = config.limit_for_key("user:42");
        assert_eq!(limit.rate, config.default_limit.rate);
    }
}
