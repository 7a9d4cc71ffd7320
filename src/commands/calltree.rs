//! Tree, overhead and paths command implementations.

use super::models::{PathsArgs, TreeArgs};
use super::utils::{emit_report, load_input};
use crate::aggregator::path_stats;
use crate::calltree::{export_tree, symbol_overhead, CallTrie};
use crate::output::{render_overhead, render_path_stats, render_tree};
use crate::parser::{OverheadReport, PathStatsReport, TreeReport};
use crate::utils::config::AnalysisConfig;
use anyhow::Result;
use log::info;

/// Execute the tree command
///
/// **Public** - main entry point called from main.rs
///
/// Exports the call tree from the root, or from every frame matching
/// `params.start_symbol`, cut at `params.depth` levels.
pub fn execute_tree(args: TreeArgs, config: &AnalysisConfig) -> Result<TreeReport> {
    let depth = args.params.depth()?;
    let start_symbol = args.params.start_symbol.as_deref().filter(|s| !s.is_empty());

    let outcome = load_input(&args.input, config)?;
    let trie = CallTrie::from_store(&outcome.store);

    let report = export_tree(&trie, start_symbol, args.params.fuzzy, depth);
    info!(
        "Exported {} tree(s) over {} nodes",
        report.trees.len(),
        trie.node_count()
    );

    emit_report("tree", &report, &args.output, render_tree)?;
    Ok(report)
}

/// Execute the overhead command
///
/// **Public** - main entry point called from main.rs
pub fn execute_overhead(args: TreeArgs, config: &AnalysisConfig) -> Result<OverheadReport> {
    let symbol = args.params.symbol()?.to_string();
    let depth = args.params.depth()?;

    let outcome = load_input(&args.input, config)?;
    let trie = CallTrie::from_store(&outcome.store);

    let report = symbol_overhead(&trie, &symbol, depth, args.params.fuzzy)?;
    info!(
        "'{}' matched {} call path(s) of total weight {}",
        symbol,
        report.results.len(),
        report.total_weight
    );

    emit_report("overhead", &report, &args.output, render_overhead)?;
    Ok(report)
}

/// Execute the paths command
///
/// **Public** - main entry point called from main.rs
pub fn execute_paths(args: PathsArgs, config: &AnalysisConfig) -> Result<PathStatsReport> {
    let limit = args.params.limit(config.path_limit)?;

    let outcome = load_input(&args.input, config)?;
    let report = path_stats(&outcome.store, limit);
    info!(
        "Weight spread over {} process(es){}",
        report.paths.len(),
        if report.truncated { " (truncated)" } else { "" }
    );

    emit_report("paths", &report, &args.output, render_path_stats)?;
    Ok(report)
}
