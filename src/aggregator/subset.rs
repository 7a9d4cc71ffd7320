//! Store filtering and per-process weight breakdown.

use super::metrics::percentage;
use super::store::{root_frame, split_frames, FoldedStore};
use crate::parser::schema::{PathStat, PathStatsReport};
use crate::utils::error::AnalysisError;
use log::debug;
use std::collections::HashMap;

/// Keep only the stacks that pass through `symbol`
///
/// **Public** - feeds subset summaries
///
/// # Arguments
/// * `store` - Source store (left untouched)
/// * `symbol` - Frame name that must appear in the stack (exact match)
/// * `process_filter` - When given, the root frame must equal it exactly
///
/// # Returns
/// A new store with the matching stacks and their original weights.
/// No match is a valid, empty store.
///
/// # Errors
/// * `AnalysisError::InvalidParameter` - Empty symbol
pub fn subset(
    store: &FoldedStore,
    symbol: &str,
    process_filter: Option<&str>,
) -> Result<FoldedStore, AnalysisError> {
    if symbol.is_empty() {
        return Err(AnalysisError::invalid("symbol is required"));
    }

    let subset: FoldedStore = store
        .iter()
        .filter(|(stack, _)| process_filter.map_or(true, |p| root_frame(stack) == p))
        .filter(|(stack, _)| split_frames(stack).any(|f| f == symbol))
        .map(|(stack, weight)| (stack.to_string(), weight))
        .collect();

    debug!(
        "Subset on '{}' kept {} of {} stacks (weight {} of {})",
        symbol,
        subset.len(),
        store.len(),
        subset.total_weight(),
        store.total_weight()
    );

    Ok(subset)
}

/// Aggregate weight by root frame (process/thread identity)
///
/// **Public** - main entry point for path statistics
///
/// # Arguments
/// * `store` - Folded stacks
/// * `limit` - Maximum number of entries returned, 0 for no limit
///
/// # Returns
/// Entries sorted by weight descending then path ascending, with
/// `truncated` set when entries were dropped
pub fn path_stats(store: &FoldedStore, limit: usize) -> PathStatsReport {
    let total = store.total_weight();

    let mut by_root: HashMap<&str, u64> = HashMap::new();
    for (stack, weight) in store.iter() {
        *by_root.entry(root_frame(stack)).or_insert(0) += weight;
    }

    let mut paths: Vec<PathStat> = by_root
        .into_iter()
        .map(|(path, weight)| PathStat {
            path: path.to_string(),
            weight,
            percentage: percentage(weight, total),
        })
        .collect();

    paths.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.path.cmp(&b.path)));

    let truncated = limit > 0 && paths.len() > limit;
    if truncated {
        paths.truncate(limit);
    }

    PathStatsReport {
        total_weight: total,
        paths,
        truncated,
    }
}
