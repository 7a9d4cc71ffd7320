//! Aggregation of folded stacks into rankings and filtered views.
//!
//! This module turns a folded store into:
//! - Top-K symbol and stack rankings (with percentages)
//! - Symbol subsets and per-process breakdowns
//! - Weight distribution statistics

pub mod metrics;
pub mod store;
pub mod subset;

// Re-export main types and functions
pub use metrics::{
    calculate_weight_distribution, children_hotspots, percentage, summarize, symbol_share,
    symbol_stats, topk_stacks, topk_symbols, ProcessScope, RankOrder, SummaryOptions,
    SymbolFilter, SymbolStat, WeightDistribution,
};
pub use store::{CollapsedStack, FoldedStore};
pub use subset::{path_stats, subset};
