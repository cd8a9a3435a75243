// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the OCAN gateway.
//!
//! This crate provides [`GatewayConfig`] — the top-level runtime settings —
//! together with helpers for loading from TOML files, merging overlays, and
//! producing advisory [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// Two configs could not be merged because of conflicting constraints.
    #[error("merge conflict: {reason}")]
    MergeConflict {
        /// Description of the conflict.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A deprecated field was used in the configuration.
    DeprecatedField {
        /// Name of the deprecated field.
        field: String,
        /// Suggested replacement, if any.
        suggestion: Option<String>,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A session idle timeout is unusually large.
    LargeTimeout {
        /// Timeout value in seconds.
        secs: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DeprecatedField { field, suggestion } => {
                write!(f, "deprecated field '{field}'")?;
                if let Some(s) = suggestion {
                    write!(f, " — use '{s}' instead")?;
                }
                Ok(())
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTimeout { secs } => {
                write!(f, "session idle timeout is unusually large ({secs}s)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level runtime configuration for the OCAN gateway (§4.E, §6).
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the gateway's axum server binds to, e.g. `"0.0.0.0:8787"`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Seconds of inactivity before a session's server-side resources are
    /// eligible for reclamation. `None` disables idle reclamation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_idle_timeout_secs: Option<u64>,

    /// Prefix searched for in `Sec-WebSocket-Protocol` to locate the
    /// `<prefix>.<base64url-jwt>` auth token (§6). The core only extracts
    /// the substring after this prefix; it never decodes the token.
    #[serde(default = "default_subprotocol_prefix")]
    pub ws_subprotocol_prefix: String,

    /// Maximum accepted request body size, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_request_body_bytes: u64,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1:8787".into()
}

fn default_subprotocol_prefix() -> String {
    "ocan-auth.".into()
}

fn default_max_body_bytes() -> u64 {
    1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            session_idle_timeout_secs: Some(300),
            ws_subprotocol_prefix: default_subprotocol_prefix(),
            max_request_body_bytes: default_max_body_bytes(),
            log_level: Some("info".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed session idle timeout in seconds (24 hours).
const MAX_IDLE_TIMEOUT_SECS: u64 = 86_400;

/// Threshold above which an idle timeout generates a warning.
const LARGE_TIMEOUT_THRESHOLD_SECS: u64 = 3_600;

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`GatewayConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`GatewayConfig::default()`].
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)
        }
        None => Ok(GatewayConfig::default()),
    }
}

/// Parse a TOML string into a [`GatewayConfig`].
pub fn parse_toml(content: &str) -> Result<GatewayConfig, ConfigError> {
    toml::from_str::<GatewayConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (invalid log level, out-of-range timeout, empty bind
/// address) are returned as a [`ConfigError::ValidationError`]; soft
/// issues come back as warnings.
pub fn validate_config(config: &GatewayConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    if config.bind_address.trim().is_empty() {
        errors.push("bind_address must not be empty".into());
    }

    if config.ws_subprotocol_prefix.trim().is_empty() {
        errors.push("ws_subprotocol_prefix must not be empty".into());
    }

    if let Some(secs) = config.session_idle_timeout_secs {
        if secs == 0 || secs > MAX_IDLE_TIMEOUT_SECS {
            errors.push(format!(
                "session_idle_timeout_secs {secs} out of range (1..{MAX_IDLE_TIMEOUT_SECS})"
            ));
        } else if secs > LARGE_TIMEOUT_THRESHOLD_SECS {
            warnings.push(ConfigWarning::LargeTimeout { secs });
        }
    } else {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "session_idle_timeout_secs".into(),
            hint: "sessions will never be idle-reclaimed; dispose must be called explicitly"
                .into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over
/// `base`.
pub fn merge_configs(base: GatewayConfig, overlay: GatewayConfig) -> GatewayConfig {
    GatewayConfig {
        bind_address: if overlay.bind_address == default_bind_address() {
            base.bind_address
        } else {
            overlay.bind_address
        },
        session_idle_timeout_secs: overlay
            .session_idle_timeout_secs
            .or(base.session_idle_timeout_secs),
        ws_subprotocol_prefix: if overlay.ws_subprotocol_prefix == default_subprotocol_prefix() {
            base.ws_subprotocol_prefix
        } else {
            overlay.ws_subprotocol_prefix
        },
        max_request_body_bytes: if overlay.max_request_body_bytes == default_max_body_bytes() {
            base.max_request_body_bytes
        } else {
            overlay.max_request_body_bytes
        },
        log_level: overlay.log_level.or(base.log_level),
    }
}
