//! Runtime configuration.
//!
//! | variable                  | default                            |
//! |---------------------------|------------------------------------|
//! | `APIPREP_BUGREPORT_EMAIL` | `<supportemailaddress goes here>`  |
//! | `APIPREP_BODY_LIMIT`      | `1048576` (bytes)                  |
//!
//! The process-wide configuration is read once, on first use. Routes can
//! carry their own [`PrepConfig`] instead.

use std::env;

use once_cell::sync::Lazy;
use thiserror::Error;

pub const BUGREPORT_EMAIL_VAR: &str = "APIPREP_BUGREPORT_EMAIL";
pub const BODY_LIMIT_VAR: &str = "APIPREP_BODY_LIMIT";

const DEFAULT_BUGREPORT_EMAIL: &str = "<supportemailaddress goes here>";
const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Types that can be loaded from environment variables.
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Returns the variable's value or `default` if it is not set.
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings used while serving prepared routes.
#[derive(Clone, Debug, PartialEq)]
pub struct PrepConfig {
    /// Address named in the message of every 500 response.
    pub bug_report_email: String,
    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            bug_report_email: DEFAULT_BUGREPORT_EMAIL.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl PrepConfig {
    pub fn with_bug_report_email(mut self, email: impl Into<String>) -> Self {
        self.bug_report_email = email.into();
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl FromEnv for PrepConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bug_report_email = env_or_default(BUGREPORT_EMAIL_VAR, DEFAULT_BUGREPORT_EMAIL);
        let body_limit = env_or_default(BODY_LIMIT_VAR, &DEFAULT_BODY_LIMIT.to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::ParseError {
                key: BODY_LIMIT_VAR.to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            bug_report_email,
            body_limit,
        })
    }
}

static GLOBAL: Lazy<PrepConfig> = Lazy::new(|| match PrepConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
        tracing::warn!(error = %e, "falling back to default configuration");
        PrepConfig::default()
    }
});

/// The process-wide configuration.
pub fn global() -> &'static PrepConfig {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        temp_env::with_vars_unset([BUGREPORT_EMAIL_VAR, BODY_LIMIT_VAR], || {
            let config = PrepConfig::from_env().unwrap();
            assert_eq!(config, PrepConfig::default());
            assert_eq!(config.bug_report_email, "<supportemailaddress goes here>");
            assert_eq!(config.body_limit, 1024 * 1024);
        });
    }

    #[test]
    fn test_values_from_env() {
        temp_env::with_vars(
            [
                (BUGREPORT_EMAIL_VAR, Some("bugs@example.com")),
                (BODY_LIMIT_VAR, Some("2048")),
            ],
            || {
                let config = PrepConfig::from_env().unwrap();
                assert_eq!(config.bug_report_email, "bugs@example.com");
                assert_eq!(config.body_limit, 2048);
            },
        );
    }

    #[test]
    fn test_invalid_body_limit() {
        temp_env::with_var(BODY_LIMIT_VAR, Some("lots"), || {
            let err = PrepConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == BODY_LIMIT_VAR));
        });
    }

    #[test]
    fn test_builders_override() {
        let config = PrepConfig::default()
            .with_bug_report_email("a@b.de")
            .with_body_limit(10);
        assert_eq!(config.bug_report_email, "a@b.de");
        assert_eq!(config.body_limit, 10);
    }
}
