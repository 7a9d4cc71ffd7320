//! Output writers for analysis reports and folded stores.
//!
//! This module handles writing data to disk in various formats:
//! - JSON reports wrapped in a versioned envelope
//! - Folded text snapshots of a store, addressed by a `StoreHandle`
//! - CSV rankings
//! - Terminal summaries

pub mod export;
pub mod json;
pub mod persist;
pub mod terminal;

// Re-export main functions
pub use export::{rows_to_csv_string, write_stacks_csv, write_symbols_csv};
pub use json::{read_report, report_to_string, wrap_report, write_report};
pub use persist::{load_store, save_store, StoreHandle};
pub use terminal::{render_overhead, render_path_stats, render_summary, render_tree};

use crate::utils::error::OutputError;
use log::debug;
use std::path::Path;

/// Validate an output path and create its parent directories
///
/// **Private** - shared by every file writer in this module
pub(crate) fn prepare_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}

/// File size in bytes, 0 when unavailable
fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
