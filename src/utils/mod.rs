//! Utility modules for configuration, error handling, and parameter validation.

pub mod config;
pub mod error;
pub mod validate;

// Re-export commonly used error types for convenience
pub use error::{AnalysisError, ConfigError, OutputError};
pub use validate::QueryParams;
