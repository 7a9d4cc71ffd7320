//! CSV export of symbol and stack rankings.

use super::prepare_output_path;
use crate::parser::schema::{StackShare, SymbolShare};
use crate::utils::error::OutputError;
use log::info;
use serde::Serialize;
use std::path::Path;

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<(), OutputError> {
    prepare_output_path(path)?;

    let mut writer = ::csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Wrote {} CSV rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write ranked symbols (`symbol,inclusive,leaf,inclusive_pct,leaf_pct`)
pub fn write_symbols_csv(rows: &[SymbolShare], path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_rows(rows, path.as_ref())
}

/// Write ranked stacks (`stack,weight,weight_pct`)
pub fn write_stacks_csv(rows: &[StackShare], path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_rows(rows, path.as_ref())
}

/// Render rows as CSV text with a header line
pub fn rows_to_csv_string<T: Serialize>(rows: &[T]) -> Result<String, OutputError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::WriteFailed(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shares() -> Vec<SymbolShare> {
        vec![SymbolShare {
            symbol: "a".to_string(),
            inclusive: 10,
            leaf: 0,
            inclusive_pct: 100.0,
            leaf_pct: 0.0,
        }]
    }

    #[test]
    fn test_rows_to_csv_string() {
        let csv = rows_to_csv_string(&shares()).unwrap();
        assert_eq!(
            csv,
            "symbol,inclusive,leaf,inclusive_pct,leaf_pct\na,10,0,100.0,0.0\n"
        );
    }

    #[test]
    fn test_write_stacks_csv() {
        let rows = vec![StackShare {
            stack: "a;b;c".to_string(),
            weight: 7,
            weight_pct: 70.0,
        }];
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out/stacks.csv");

        write_stacks_csv(&rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "stack,weight,weight_pct\na;b;c,7,70.0\n");
    }

    #[test]
    fn test_write_symbols_csv_empty_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("symbols.csv");
        write_symbols_csv(&[], &path).unwrap();
        assert!(path.exists());
    }
}
