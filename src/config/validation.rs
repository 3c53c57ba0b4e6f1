//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadline bounds, connect timeout > 0)
//! - Check addresses and the upstream URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SearchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::SearchConfig;

/// Longest deadline accepted for a single search.
pub const MAX_DEADLINE_MS: u64 = 60_000;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("timeouts.deadline_ms must be within 1..={max}, got {got}")]
    DeadlineOutOfRange { got: u64, max: u64 },

    #[error("timeouts.connect_ms must be greater than 0")]
    ZeroConnectTimeout,

    #[error("{field} is not a socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url is invalid: {0}")]
    InvalidUpstreamUrl(String),

    #[error("observability.log_level must be one of trace|debug|info|warn|error, got {0}")]
    UnknownLogLevel(String),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &SearchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let deadline = config.timeouts.deadline_ms;
    if deadline == 0 || deadline > MAX_DEADLINE_MS {
        errors.push(ValidationError::DeadlineOutOfRange {
            got: deadline,
            max: MAX_DEADLINE_MS,
        });
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUpstreamUrl(format!(
            "unsupported scheme `{}`",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidUpstreamUrl(e.to_string())),
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
