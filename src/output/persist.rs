//! Folded text snapshots of a store.
//!
//! A saved store is plain folded text, sorted by stack, so it can be fed to
//! any folded-stack tool. Callers keep the returned `StoreHandle` and pass it
//! back to `load_store`; nothing is cached behind their back.

use super::{file_size, prepare_output_path};
use crate::aggregator::store::FoldedStore;
use crate::parser::folded::fold_snapshot;
use crate::utils::error::{AnalysisError, OutputError};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Reference to a persisted folded store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreHandle(PathBuf);

impl StoreHandle {
    /// Refer to an existing folded file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Persist a store as sorted folded text
///
/// # Errors
/// * `OutputError::InvalidPath` - Path is empty, a directory, or its parent
///   cannot be created
/// * `OutputError::WriteFailed` - I/O error during write
pub fn save_store(store: &FoldedStore, path: impl AsRef<Path>) -> Result<StoreHandle, OutputError> {
    let path = path.as_ref();
    prepare_output_path(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    for line in store.to_lines() {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;

    info!(
        "Saved {} stacks to {} ({} bytes)",
        store.len(),
        path.display(),
        file_size(path)
    );

    Ok(StoreHandle(path.to_path_buf()))
}

/// Fold a persisted store back into memory
///
/// # Errors
/// * `AnalysisError::SourceUnavailable` - File missing or unreadable
/// * `AnalysisError::EmptyOrMalformedInput` - File has lines but none of
///   them is a folded record
///
/// An empty file loads as an empty store, so a saved empty subset can be
/// reloaded.
pub fn load_store(handle: &StoreHandle) -> Result<FoldedStore, AnalysisError> {
    Ok(fold_snapshot(handle.path())?.store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_store() {
        let mut store = FoldedStore::new();
        store.insert("a;b;c", 7);
        store.insert("a;b;d", 3);

        let temp_dir = tempfile::tempdir().unwrap();
        let handle = save_store(&store, temp_dir.path().join("stacks.folded")).unwrap();

        let text = std::fs::read_to_string(handle.path()).unwrap();
        assert_eq!(text, "a;b;c 7\na;b;d 3\n");

        let loaded = load_store(&handle).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_missing_store() {
        let handle = StoreHandle::from_path("/nonexistent/stacks.folded");
        assert!(matches!(
            load_store(&handle),
            Err(AnalysisError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_saved_empty_store_reloads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let handle = save_store(&FoldedStore::new(), temp_dir.path().join("empty.folded")).unwrap();

        let loaded = load_store(&handle).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.total_weight(), 0);
    }

    #[test]
    fn test_load_all_malformed_store_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.folded");
        std::fs::write(&path, "not a record\nstill not\n").unwrap();

        assert!(matches!(
            load_store(&StoreHandle::from_path(&path)),
            Err(AnalysisError::EmptyOrMalformedInput { lines_read: 2, skipped_lines: 2 })
        ));
    }
}
