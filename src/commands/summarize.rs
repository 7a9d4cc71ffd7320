//! Summarize, subset and callees command implementations.
//!
//! All three fold the input, optionally narrow the store, and rank symbols
//! and stacks over what is left.

use super::models::{CalleesArgs, SubsetArgs, SummarizeArgs};
use super::utils::{emit_report, load_input};
use crate::aggregator::metrics::create_symbol_share;
use crate::aggregator::{
    calculate_weight_distribution, children_hotspots, subset, summarize, symbol_share,
    ProcessScope, SummaryOptions,
};
use crate::output::{render_summary, save_store, write_stacks_csv, write_symbols_csv};
use crate::parser::{CalleesReport, SummaryReport};
use crate::utils::config::AnalysisConfig;
use crate::utils::validate::QueryParams;
use anyhow::{Context, Result};
use log::{debug, info};

fn summary_options(params: &QueryParams, config: &AnalysisConfig) -> Result<SummaryOptions> {
    Ok(SummaryOptions {
        topk_symbols: params.topk_symbols(config.topk_symbols)?,
        topk_stacks: params.topk_stacks(config.topk_stacks)?,
        order: params.order(config.order)?,
        ..Default::default()
    })
}

/// Execute the summarize command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The summary report that was emitted
///
/// # Errors
/// * Invalid counts, order or process regex
/// * Unreadable or empty input
/// * File write errors
pub fn execute_summarize(args: SummarizeArgs, config: &AnalysisConfig) -> Result<SummaryReport> {
    // Validate before touching the input
    let mut options = summary_options(&args.params, config)?;
    options.scope = ProcessScope::new(args.proc_prefix.clone(), args.proc_regex.as_deref())?;
    if !args.filter.is_empty() {
        options.filter = Some(args.filter.clone());
    }

    info!("Step 1/3: Folding input...");
    let outcome = load_input(&args.input, config)?;

    let distribution = calculate_weight_distribution(&outcome.store);
    info!("Weight distribution: {}", distribution.summary());

    info!(
        "Step 2/3: Ranking top {} symbols ({}) and top {} stacks...",
        options.topk_symbols, options.order, options.topk_stacks
    );
    let report = summarize(&outcome.store, &options);

    debug!("Top 3 symbols:");
    for (i, share) in report.top_symbols.iter().take(3).enumerate() {
        debug!(
            "  {}. {} incl {} ({:.1}%), leaf {} ({:.1}%)",
            i + 1,
            share.symbol,
            share.inclusive,
            share.inclusive_pct,
            share.leaf,
            share.leaf_pct
        );
    }

    info!("Step 3/3: Writing outputs...");
    if let Some(path) = &args.symbols_csv {
        write_symbols_csv(&report.top_symbols, path).context("Failed to write symbols CSV")?;
        info!("✓ Symbols CSV written to: {}", path.display());
    }
    if let Some(path) = &args.stacks_csv {
        write_stacks_csv(&report.top_stacks, path).context("Failed to write stacks CSV")?;
        info!("✓ Stacks CSV written to: {}", path.display());
    }

    emit_report("summarize", &report, &args.output, render_summary)?;

    Ok(report)
}

/// Execute the subset command
///
/// **Public** - main entry point called from main.rs
///
/// Keeps the stacks containing `params.symbol` (and rooted at
/// `params.process_filter` when given), then summarizes them. Percentages
/// are relative to the subset total.
pub fn execute_subset(args: SubsetArgs, config: &AnalysisConfig) -> Result<SummaryReport> {
    let symbol = args.params.symbol()?.to_string();
    let options = summary_options(&args.params, config)?;

    info!("Step 1/3: Folding input...");
    let outcome = load_input(&args.input, config)?;

    info!("Step 2/3: Selecting stacks containing '{}'...", symbol);
    let selected = subset(&outcome.store, &symbol, args.params.process_filter.as_deref())?;
    info!(
        "Subset holds {} of {} stacks ({} of {} weight)",
        selected.len(),
        outcome.store.len(),
        selected.total_weight(),
        outcome.store.total_weight()
    );

    if let Some(save_path) = &args.save {
        let handle = save_store(&selected, save_path).context("Failed to save subset store")?;
        info!("✓ Subset stacks written to: {}", handle.path().display());
    }

    info!("Step 3/3: Ranking subset...");
    let report = summarize(&selected, &options);
    emit_report("subset", &report, &args.output, render_summary)?;

    Ok(report)
}

/// Execute the callees command
///
/// **Public** - main entry point called from main.rs
///
/// Ranks the frames called directly by `params.symbol`, with shares of the
/// whole profile.
pub fn execute_callees(args: CalleesArgs, config: &AnalysisConfig) -> Result<CalleesReport> {
    let parent = args.params.symbol()?.to_string();
    let order = args.params.order(config.order)?;
    let topk = args.params.topk_symbols(config.topk_symbols)?;

    let outcome = load_input(&args.input, config)?;
    let total = outcome.store.total_weight();

    let mut callees = children_hotspots(&outcome.store, &parent, order);
    callees.truncate(topk);

    let report = CalleesReport {
        parent_pct: (symbol_share(&outcome.store, &parent, order) * 10_000.0).round() / 100.0,
        total_weight: total,
        callees: callees
            .into_iter()
            .map(|stat| create_symbol_share(stat, total))
            .collect(),
        parent,
    };

    info!(
        "'{}' holds {:.2}% ({}) with {} direct callee(s)",
        report.parent,
        report.parent_pct,
        order,
        report.callees.len()
    );

    emit_report("callees", &report, &args.output, |r| {
        let summary = SummaryReport {
            total_weight: r.total_weight,
            top_symbols: r.callees.clone(),
            top_stacks: Vec::new(),
        };
        render_summary(&summary)
    })?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::RankOrder;
    use crate::commands::models::{InputArgs, OutputArgs};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const STACKS: &str = "a;b;c 5\na;b;d 3\na;b;c 2\n";

    fn write_input(dir: &Path) -> (InputArgs, OutputArgs) {
        let input = dir.join("stacks.folded");
        std::fs::write(&input, STACKS).unwrap();
        (
            InputArgs {
                path: input,
                ..Default::default()
            },
            OutputArgs {
                path: Some(dir.join("report.json")),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_summarize_leaf_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let args = SummarizeArgs {
            input,
            output,
            params: QueryParams {
                order: Some("leaf".to_string()),
                topk_symbols: Some(2),
                ..Default::default()
            },
            symbols_csv: Some(temp_dir.path().join("symbols.csv")),
            ..Default::default()
        };

        let report = execute_summarize(args, &AnalysisConfig::default()).unwrap();
        let leaders: Vec<(&str, u64)> = report
            .top_symbols
            .iter()
            .map(|s| (s.symbol.as_str(), s.leaf))
            .collect();
        assert_eq!(leaders, vec![("c", 7), ("d", 3)]);
        assert!(temp_dir.path().join("symbols.csv").exists());
        assert!(temp_dir.path().join("report.json").exists());
    }

    #[test]
    fn test_summarize_config_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let config = AnalysisConfig {
            topk_stacks: 1,
            order: RankOrder::Leaf,
            ..Default::default()
        };
        let args = SummarizeArgs {
            input,
            output,
            ..Default::default()
        };

        let report = execute_summarize(args, &config).unwrap();
        assert_eq!(report.top_stacks.len(), 1);
        assert_eq!(report.top_symbols[0].symbol, "c");
    }

    #[test]
    fn test_summarize_rejects_bad_params() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let args = SummarizeArgs {
            input: input.clone(),
            output: output.clone(),
            params: QueryParams {
                topk_symbols: Some(-1),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(execute_summarize(args, &AnalysisConfig::default()).is_err());

        let args = SummarizeArgs {
            input,
            output,
            proc_regex: Some("(".to_string()),
            ..Default::default()
        };
        assert!(execute_summarize(args, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_subset_on_symbol() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let args = SubsetArgs {
            input,
            output,
            params: QueryParams {
                symbol: Some("d".to_string()),
                ..Default::default()
            },
            save: Some(temp_dir.path().join("d.folded")),
        };

        let report = execute_subset(args, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.total_weight, 3);
        assert_eq!(report.top_stacks[0].stack, "a;b;d");
        let d = report.top_symbols.iter().find(|s| s.symbol == "d").unwrap();
        assert_eq!(d.leaf_pct, 100.0);

        let saved = std::fs::read_to_string(temp_dir.path().join("d.folded")).unwrap();
        assert_eq!(saved, "a;b;d 3\n");
    }

    #[test]
    fn test_subset_requires_symbol() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let args = SubsetArgs {
            input,
            output,
            ..Default::default()
        };
        assert!(execute_subset(args, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn test_callees() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (input, output) = write_input(temp_dir.path());
        let args = CalleesArgs {
            input,
            output,
            params: QueryParams {
                symbol: Some("b".to_string()),
                ..Default::default()
            },
        };

        let report = execute_callees(args, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.parent, "b");
        assert_eq!(report.parent_pct, 100.0);
        let callees: Vec<(&str, u64)> = report
            .callees
            .iter()
            .map(|s| (s.symbol.as_str(), s.inclusive))
            .collect();
        assert_eq!(callees, vec![("c", 7), ("d", 3)]);
        assert_eq!(report.callees[0].inclusive_pct, 70.0);
    }
}
