//! JSON report output writer.
//!
//! Every report file is wrapped in a `ReportEnvelope` carrying the schema
//! version, the producing command and a generation timestamp.

use super::{file_size, prepare_output_path};
use crate::parser::schema::ReportEnvelope;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Wrap a report in the current schema envelope
pub fn wrap_report<T>(command: &str, report: T) -> ReportEnvelope<T> {
    ReportEnvelope {
        schema_version: SCHEMA_VERSION.to_string(),
        command: command.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        report,
    }
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `command` - Name of the query that produced the report
/// * `report` - Report data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = summarize(&store, &SummaryOptions::default());
/// write_report("summarize", &report, "summary.json")?;
/// ```
pub fn write_report<T: Serialize>(
    command: &str,
    report: &T,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing {} report to: {}", command, output_path.display());

    prepare_output_path(output_path)?;

    let file = File::create(output_path)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &wrap_report(command, report))?;

    info!("Report written successfully ({} bytes)", file_size(output_path));

    Ok(())
}

/// Serialize a wrapped report to a pretty JSON string
pub fn report_to_string<T: Serialize>(command: &str, report: &T) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(&wrap_report(command, report))?)
}

/// Read a wrapped report from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report<T: DeserializeOwned>(
    input_path: impl AsRef<Path>,
) -> Result<ReportEnvelope<T>, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path)?;
    let envelope: ReportEnvelope<T> = serde_json::from_reader(BufReader::new(file))?;

    debug!(
        "Report loaded: command {}, schema {}",
        envelope.command, envelope.schema_version
    );

    Ok(envelope)
}
