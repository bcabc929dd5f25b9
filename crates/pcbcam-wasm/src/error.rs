//! Error types for the CAM pipeline and its input readers.

use thiserror::Error;

/// Errors that can occur while reading inputs or producing tool paths.
#[derive(Debug, Error)]
pub enum CamError {
    /// A drill or configuration file could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A configuration variable is unknown or carries an invalid value.
    #[error("config error: {0}")]
    ConfigError(String),

    /// The caller supplied input the pipeline cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Writing machine-control text failed.
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}
