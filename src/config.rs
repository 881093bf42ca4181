use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MediBridge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment switch for strict mode.
pub const STRICT_MODE_ENV: &str = "MEDIBRIDGE_STRICT_MODE";
/// Environment switch for automatic remediation.
pub const AUTO_SANITIZE_ENV: &str = "MEDIBRIDGE_AUTO_SANITIZE";

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medibridge_lib=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} (expected true/false)")]
    InvalidFlag { key: &'static str, value: String },
}

/// How the validation pipeline judges and remediates a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Strict: a structural failure stops the pipeline, and any violation in
    /// the payload as received makes it invalid. Relaxed: only critical
    /// content left after remediation makes it invalid.
    pub strict_mode: bool,
    /// Remediate violations (sanitize or replace) and re-verify.
    pub auto_sanitize: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict_mode: true,
            auto_sanitize: true,
        }
    }
}

impl ValidationOptions {
    /// Relaxed, auto-sanitizing mode used by the client boundary.
    pub fn client() -> Self {
        Self {
            strict_mode: false,
            auto_sanitize: true,
        }
    }

    /// Defaults overlaid with `MEDIBRIDGE_STRICT_MODE` / `MEDIBRIDGE_AUTO_SANITIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each switch.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        if let Some(value) = lookup(STRICT_MODE_ENV) {
            options.strict_mode = parse_flag(STRICT_MODE_ENV, &value)?;
        }
        if let Some(value) = lookup(AUTO_SANITIZE_ENV) {
            options.auto_sanitize = parse_flag(AUTO_SANITIZE_ENV, &value)?;
        }
        Ok(options)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key,
            value: value.to_string(),
        }),
    }
}
