//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A numeric setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A decimal setting could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidDecimal {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Temperature outside the range providers accept.
    #[error("llm temperature must be within 0.0..=2.0 (got {value})")]
    InvalidTemperature { value: f64 },

    /// A setting that must be positive was zero.
    #[error("{name} must be greater than zero")]
    MustBePositive { name: &'static str },

    /// Terminal-status writes need at least one retry.
    #[error("persist attempts must be at least 2 (got {value})")]
    TooFewPersistAttempts { value: u32 },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
