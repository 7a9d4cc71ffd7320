//! Collapse command implementation.
//!
//! The collapse command:
//! 1. Folds folded or perf script input into a store
//! 2. Optionally persists the store as folded text
//! 3. Reports fold metadata with a preview of the folded lines

use super::models::CollapseArgs;
use super::utils::{emit_report, load_input};
use crate::output::save_store;
use crate::parser::CollapseReport;
use crate::utils::config::AnalysisConfig;
use anyhow::{Context, Result};
use log::info;
use std::time::Instant;

/// Execute the collapse command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The collapse report that was emitted
///
/// # Errors
/// * Unreadable or empty input
/// * Negative preview limit
/// * File write errors
pub fn execute_collapse(args: CollapseArgs, config: &AnalysisConfig) -> Result<CollapseReport> {
    let start_time = Instant::now();
    let limit = args.params.limit(config.preview_limit)?;

    info!("Step 1/3: Folding input...");
    let outcome = load_input(&args.input, config)?;

    let mut report = outcome.report(limit);

    if let Some(save_path) = &args.save {
        info!("Step 2/3: Saving folded store...");
        let handle = save_store(&outcome.store, save_path).context("Failed to save folded store")?;
        info!("✓ Folded stacks written to: {}", handle.path().display());
        report.output = Some(handle.path().display().to_string());
    } else {
        info!("Step 2/3: Skipping store persistence (not requested)");
    }

    info!("Step 3/3: Writing report...");
    emit_report("collapse", &report, &args.output, |r| r.lines.join("\n"))?;

    info!(
        "Collapse completed in {:.2}s ({} unique stacks, {} skipped lines)",
        start_time.elapsed().as_secs_f64(),
        report.unique_stacks,
        report.skipped_lines
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::models::{InputArgs, InputFormat, OutputArgs};
    use crate::output::{load_store, StoreHandle};
    use crate::utils::validate::QueryParams;
    use std::path::PathBuf;

    fn args_for(path: PathBuf, format: InputFormat) -> CollapseArgs {
        let out = path.with_extension("json");
        CollapseArgs {
            input: InputArgs {
                path,
                format,
                ..Default::default()
            },
            output: OutputArgs {
                path: Some(out),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_collapse_perf_script_and_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("perf.txt");
        std::fs::write(
            &input,
            "java 100 1.0: cycles:\n\tffff main (/bin/java)\n\n\
             java 100 2.0: cycles:\n\tffff main (/bin/java)\n\n",
        )
        .unwrap();
        let save = temp_dir.path().join("out/java.folded");

        let mut args = args_for(input, InputFormat::Perf);
        args.save = Some(save.clone());

        let report = execute_collapse(args, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.lines, vec!["java;main 2".to_string()]);
        assert_eq!(report.output.as_deref(), Some(save.display().to_string().as_str()));

        let store = load_store(&StoreHandle::from_path(&save)).unwrap();
        assert_eq!(store.total_weight(), 2);
    }

    #[test]
    fn test_collapse_preview_limit() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("stacks.folded");
        std::fs::write(&input, "a 1\nb 2\nc 3\n").unwrap();

        let mut args = args_for(input, InputFormat::Folded);
        args.params = QueryParams {
            limit: Some(2),
            ..Default::default()
        };

        let report = execute_collapse(args, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.lines, vec!["a 1".to_string(), "b 2".to_string()]);
        assert!(report.truncated);
        assert_eq!(report.total_weight, 6);
    }

    #[test]
    fn test_collapse_negative_limit() {
        let mut args = args_for(PathBuf::from("unused.folded"), InputFormat::Folded);
        args.params.limit = Some(-1);
        assert!(execute_collapse(args, &AnalysisConfig::default()).is_err());
    }
}
