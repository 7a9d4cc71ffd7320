use super::models::{InputArgs, InputFormat, OutputArgs, OutputFormat};
use crate::output::{read_report, report_to_string, write_report};
use crate::parser::{collapse_file, fold_file, CollapseOptions, FoldOutcome};
use crate::utils::config::{AnalysisConfig, SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::PathBuf;

/// Fold the command input into a store
///
/// Perf script options from the command line are merged over the ones in
/// the config file: switches are OR-ed, a non-empty event filter wins.
pub fn load_input(input: &InputArgs, config: &AnalysisConfig) -> Result<FoldOutcome> {
    info!("Reading {:?} input from {}", input.format, input.path.display());

    let outcome = match input.format {
        InputFormat::Folded => fold_file(&input.path),
        InputFormat::Perf => {
            let options = merge_collapse_options(&config.collapse, &input.collapse);
            debug!("Collapse options: {:?}", options);
            collapse_file(&input.path, &options)
        }
    }
    .with_context(|| format!("Failed to fold input {}", input.path.display()))?;

    Ok(outcome)
}

fn merge_collapse_options(base: &CollapseOptions, cli: &CollapseOptions) -> CollapseOptions {
    CollapseOptions {
        include_pid: base.include_pid || cli.include_pid,
        include_tid: base.include_tid || cli.include_tid,
        kernel: base.kernel || cli.kernel,
        jit: base.jit || cli.jit,
        annotate_all: base.annotate_all || cli.annotate_all,
        addrs: base.addrs || cli.addrs,
        event_filter: if cli.event_filter.is_empty() {
            base.event_filter.clone()
        } else {
            cli.event_filter.clone()
        },
        period_weights: base.period_weights || cli.period_weights,
    }
}

/// Write a report to its file, or print it to stdout
pub fn emit_report<T, F>(command: &str, report: &T, output: &OutputArgs, render: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if let Some(path) = &output.path {
        write_report(command, report, path)
            .with_context(|| format!("Failed to write {} report", command))?;
        info!("✓ Report written to: {}", path.display());
        return Ok(());
    }

    match output.format {
        OutputFormat::Json => {
            let json = report_to_string(command, report)
                .with_context(|| format!("Failed to serialize {} report", command))?;
            println!("{}", json);
        }
        OutputFormat::Table => println!("{}", render(report)),
    }
    Ok(())
}

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let envelope = read_report::<serde_json::Value>(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    let major = |v: &str| v.split('.').next().map(str::to_string);
    if major(&envelope.schema_version) != major(SCHEMA_VERSION) {
        warn!(
            "Report schema v{} differs from current v{}",
            envelope.schema_version, SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Schema:    {}", envelope.schema_version);
    println!("  Command:   {}", envelope.command);
    println!("  Generated: {}", envelope.generated_at);
    if let Some(total) = envelope.report.get("total_weight") {
        println!("  Total Weight: {}", total);
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("foldscope Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Envelope:");
        println!("  schema_version: string   - Schema version (e.g., '1.0.0')");
        println!("  command: string          - Query that produced the report");
        println!("  generated_at: string     - ISO 8601 timestamp");
        println!("  report: object           - One of the reports below");
        println!();
        println!("summarize / subset:");
        println!("  total_weight: number");
        println!("  top_symbols: array       - {{symbol, inclusive, leaf, inclusive_pct, leaf_pct}}");
        println!("  top_stacks: array        - {{stack, weight, weight_pct}}");
        println!("tree:");
        println!("  total_weight: number");
        println!("  trees: array             - {{name, count, leaf_count, children}}");
        println!("overhead:");
        println!("  total_weight: number");
        println!("  results: array           - {{symbol, path, inclusive, leaf, inclusive_pct, leaf_pct}}");
        println!("paths:");
        println!("  total_weight: number");
        println!("  paths: array             - {{path, weight, percentage}}");
        println!("  truncated: bool");
        println!("callees:");
        println!("  parent: string, total_weight: number, parent_pct: number");
        println!("  callees: array           - same entries as top_symbols");
        println!("collapse:");
        println!("  total_weight, unique_stacks, lines_read, skipped_lines: number");
        println!("  lines: array of string   - Folded lines (sorted)");
        println!("  truncated: bool, output: string?");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("foldscope v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Stack-trace profile analysis: folding, rankings, call trees.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::write_report;
    use crate::parser::schema::PathStatsReport;
    use std::io::Write;

    #[test]
    fn test_merge_collapse_options() {
        let base = CollapseOptions {
            include_pid: true,
            event_filter: "cycles".to_string(),
            ..Default::default()
        };
        let cli = CollapseOptions {
            kernel: true,
            ..Default::default()
        };
        let merged = merge_collapse_options(&base, &cli);
        assert!(merged.include_pid && merged.kernel);
        assert_eq!(merged.event_filter, "cycles");

        let cli = CollapseOptions {
            event_filter: "instructions".to_string(),
            ..Default::default()
        };
        assert_eq!(merge_collapse_options(&base, &cli).event_filter, "instructions");
    }

    #[test]
    fn test_load_input_folded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a;b 3\nbad line\na;c 1").unwrap();

        let input = InputArgs {
            path: file.path().to_path_buf(),
            ..Default::default()
        };
        let outcome = load_input(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(outcome.store.total_weight(), 4);
        assert_eq!(outcome.skipped_lines, 1);
    }

    #[test]
    fn test_load_input_missing_file() {
        let input = InputArgs {
            path: PathBuf::from("/nonexistent/stacks.folded"),
            ..Default::default()
        };
        assert!(load_input(&input, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_validate_report_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("paths.json");
        let report = PathStatsReport {
            total_weight: 0,
            paths: vec![],
            truncated: false,
        };
        write_report("paths", &report, &path).unwrap();

        assert!(validate_report_file(path).is_ok());
        assert!(validate_report_file(temp_dir.path().join("missing.json")).is_err());
    }
}
