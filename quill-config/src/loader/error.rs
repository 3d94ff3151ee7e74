use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ConfigGuardRailError;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file missing: {path}")]
    MissingConfig {
        /// Path that was requested.
        path: PathBuf,
    },
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration {path}")]
    Io {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file does not parse as
    /// [`FileConfig`](super::sources::FileConfig).
    #[error("failed to parse configuration {path}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The completion base URL is not an absolute http(s) URL.
    #[error("invalid completion base URL '{value}': {reason}")]
    InvalidBaseUrl {
        /// Rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A duration field could not be parsed.
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: String,
        /// Parser error.
        #[source]
        source: humantime::DurationError,
    },
    /// A resolved value violates a guard rail.
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    /// The `.env` file exists but is malformed.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
