//! Environment-driven throttle configuration.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `THROTTLE_LIMIT` | actions per window | `3` |
//! | `THROTTLE_WINDOW_MS` | window length in milliseconds | `300000` |
//! | `THROTTLE_WINDOW_MODE` | `rolling` or `fixed` | `rolling` |
//! | `PUBLIC_APP_URL` | base URL for account links | unset |
//! | `REPLIT_DOMAINS` | comma-separated app domains | unset |

use crate::domain::email::{AppLinks, LOCAL_BASE_URL};
use crate::domain::policy::{WindowMode, WindowPolicy, DEFAULT_LIMIT, DEFAULT_WINDOW};
use std::env;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

pub const LIMIT_VAR: &str = "THROTTLE_LIMIT";
pub const WINDOW_MS_VAR: &str = "THROTTLE_WINDOW_MS";
pub const WINDOW_MODE_VAR: &str = "THROTTLE_WINDOW_MODE";
pub const PUBLIC_APP_URL_VAR: &str = "PUBLIC_APP_URL";
pub const APP_DOMAINS_VAR: &str = "REPLIT_DOMAINS";

/// Error returned when an environment value cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

impl ConfigError {
    fn new(key: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Name of the offending variable.
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} value {:?}: {}",
            self.key, self.value, self.reason
        )
    }
}

impl std::error::Error for ConfigError {}

/// Throttle settings, usually loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub limit: u32,
    pub window: Duration,
    pub mode: WindowMode,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            mode: WindowMode::default(),
        }
    }
}

impl ThrottleConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary lookup function.
    ///
    /// Unset variables fall back to defaults. Set but unparsable variables
    /// are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let limit = match lookup(LIMIT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| invalid(LIMIT_VAR, &raw, e))?,
            None => {
                info!("{LIMIT_VAR} not set, using default: {}", defaults.limit);
                defaults.limit
            }
        };

        let window = match lookup(WINDOW_MS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| invalid(WINDOW_MS_VAR, &raw, e))?,
            None => {
                info!(
                    "{WINDOW_MS_VAR} not set, using default: {}",
                    defaults.window.as_millis()
                );
                defaults.window
            }
        };

        let mode = match lookup(WINDOW_MODE_VAR) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "rolling" => WindowMode::Rolling,
                "fixed" => WindowMode::Fixed,
                _ => return Err(invalid(WINDOW_MODE_VAR, &raw, "expected rolling or fixed")),
            },
            None => defaults.mode,
        };

        Ok(Self {
            limit,
            window,
            mode,
        })
    }

    /// The window policy described by this configuration.
    pub fn policy(&self) -> WindowPolicy {
        WindowPolicy::new(self.limit, self.window, self.mode)
    }
}

/// Settings for the links in account emails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkConfig {
    pub public_app_url: Option<String>,
    pub domains: Vec<String>,
}

impl LinkConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary lookup function. Every value is accepted.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_app_url = lookup(PUBLIC_APP_URL_VAR);
        let domains: Vec<String> = lookup(APP_DOMAINS_VAR)
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        let config = Self {
            public_app_url,
            domains,
        };
        if config.public_app_url.is_none() && config.domains.is_empty() {
            info!("{PUBLIC_APP_URL_VAR} and {APP_DOMAINS_VAR} not set, links use {LOCAL_BASE_URL}");
        }
        config
    }

    /// The link settings described by this configuration.
    pub fn links(&self) -> AppLinks {
        AppLinks::new(self.public_app_url.clone(), &self.domains)
    }
}

fn invalid(key: &'static str, raw: &str, reason: impl fmt::Display) -> ConfigError {
    let err = ConfigError::new(key, raw, reason);
    warn!("{err}");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ThrottleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ThrottleConfig::default());
        assert_eq!(config.limit, 3);
        assert_eq!(config.window, Duration::from_millis(300_000));
    }

    #[test]
    fn test_values_from_lookup() {
        let config = ThrottleConfig::from_lookup(lookup(&[
            (LIMIT_VAR, "5"),
            (WINDOW_MS_VAR, " 60000 "),
            (WINDOW_MODE_VAR, "Fixed"),
        ]))
        .unwrap();

        assert_eq!(config.limit, 5);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.mode, WindowMode::Fixed);
        assert_eq!(config.policy(), WindowPolicy::fixed(5, Duration::from_secs(60)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ThrottleConfig::from_lookup(lookup(&[(LIMIT_VAR, "-1")])).unwrap_err();
        assert_eq!(err.key(), LIMIT_VAR);

        let err = ThrottleConfig::from_lookup(lookup(&[(WINDOW_MS_VAR, "5m")])).unwrap_err();
        assert_eq!(err.key(), WINDOW_MS_VAR);

        let err = ThrottleConfig::from_lookup(lookup(&[(WINDOW_MODE_VAR, "sliding")])).unwrap_err();
        assert_eq!(err.key(), WINDOW_MODE_VAR);
        assert!(err.to_string().contains("sliding"));
    }

    #[test]
    fn test_link_config() {
        let config = LinkConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LinkConfig::default());
        assert_eq!(config.links().base_url(None), LOCAL_BASE_URL);

        let config = LinkConfig::from_lookup(lookup(&[(
            APP_DOMAINS_VAR,
            "abc.replit.app, lizatoph.com",
        )]));
        assert_eq!(config.links().reset_url("t"), "https://lizatoph.com/reset-password/t");

        let config = LinkConfig::from_lookup(lookup(&[
            (PUBLIC_APP_URL_VAR, "https://app.lizatoph.com/"),
            (APP_DOMAINS_VAR, "lizatoph.com"),
        ]));
        assert_eq!(config.links().base_url(None), "https://app.lizatoph.com");
    }
}
