//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while folding input or answering a query
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Cannot read input {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No valid stacks in input ({skipped_lines} of {lines_read} lines malformed)")]
    EmptyOrMalformedInput {
        lines_read: usize,
        skipped_lines: usize,
    },
}

impl AnalysisError {
    /// Shorthand used by the parameter validators
    pub fn invalid(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter(msg.into())
    }

    /// Stable kind name, used in CLI error output
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidParameter(_) => "InvalidParameter",
            AnalysisError::SourceUnavailable { .. } => "SourceUnavailable",
            AnalysisError::EmptyOrMalformedInput { .. } => "EmptyOrMalformedInput",
        }
    }
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading the analysis config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    ParseFailed(#[from] toml::de::Error),
}
