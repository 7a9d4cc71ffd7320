//! Top-K hotspot ranking over a folded store.
//!
//! Symbols are ranked by inclusive weight (the symbol is anywhere on the
//! path) or leaf weight (the symbol is the sampled frame). Stacks are ranked
//! by their own weight. These are the primary targets for optimization.

use super::store::{root_frame, split_frames, CollapsedStack, FoldedStore};
use crate::parser::schema::{StackShare, SummaryReport, SymbolShare};
use crate::utils::config::{CONCENTRATION_THRESHOLD_PERCENT, DEFAULT_TOPK};
use crate::utils::error::AnalysisError;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Field used to rank symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    #[default]
    Inclusive,
    Leaf,
}

impl RankOrder {
    fn key(self, stat: &SymbolStat) -> u64 {
        match self {
            RankOrder::Inclusive => stat.inclusive,
            RankOrder::Leaf => stat.leaf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RankOrder::Inclusive => "inclusive",
            RankOrder::Leaf => "leaf",
        }
    }
}

impl FromStr for RankOrder {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inclusive" => Ok(RankOrder::Inclusive),
            "leaf" => Ok(RankOrder::Leaf),
            other => Err(AnalysisError::invalid(format!(
                "order must be 'inclusive' or 'leaf' (got '{}')",
                other
            ))),
        }
    }
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight attributed to one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolStat {
    pub symbol: String,
    pub inclusive: u64,
    pub leaf: u64,
}

/// Include/exclude rules on symbol names
///
/// With include rules present a symbol must match at least one of them;
/// exclude rules always win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolFilter {
    pub include_prefixes: Vec<String>,
    pub include_suffixes: Vec<String>,
    pub exclude_prefixes: Vec<String>,
    pub exclude_suffixes: Vec<String>,
}

impl SymbolFilter {
    pub fn is_empty(&self) -> bool {
        self.include_prefixes.is_empty()
            && self.include_suffixes.is_empty()
            && self.exclude_prefixes.is_empty()
            && self.exclude_suffixes.is_empty()
    }

    pub fn matches(&self, symbol: &str) -> bool {
        let has_includes = !self.include_prefixes.is_empty() || !self.include_suffixes.is_empty();
        if has_includes {
            let included = self.include_prefixes.iter().any(|p| symbol.starts_with(p.as_str()))
                || self.include_suffixes.iter().any(|s| symbol.ends_with(s.as_str()));
            if !included {
                return false;
            }
        }

        !(self.exclude_prefixes.iter().any(|p| symbol.starts_with(p.as_str()))
            || self.exclude_suffixes.iter().any(|s| symbol.ends_with(s.as_str())))
    }
}

/// Restricts which stacks count, by their root (process) frame
#[derive(Debug, Clone, Default)]
pub struct ProcessScope {
    prefix: Option<String>,
    regex: Option<Regex>,
}

impl ProcessScope {
    /// Build a scope; an invalid regex is a parameter error
    pub fn new(prefix: Option<String>, pattern: Option<&str>) -> Result<Self, AnalysisError> {
        let regex = match pattern.filter(|p| !p.is_empty()) {
            Some(p) => Some(Regex::new(p).map_err(|e| {
                AnalysisError::invalid(format!("proc_regex '{}' is invalid: {}", p, e))
            })?),
            None => None,
        };

        Ok(Self { prefix, regex })
    }

    pub fn is_unrestricted(&self) -> bool {
        self.prefix.is_none() && self.regex.is_none()
    }

    pub fn matches(&self, stack: &str) -> bool {
        let root = root_frame(stack);
        if let Some(prefix) = &self.prefix {
            if !root.starts_with(prefix.as_str()) {
                return false;
            }
        }
        match &self.regex {
            Some(re) => re.is_match(root),
            None => true,
        }
    }
}

/// Parameters of a summarize query
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub topk_symbols: usize,
    pub topk_stacks: usize,
    pub order: RankOrder,
    pub filter: Option<SymbolFilter>,
    pub scope: ProcessScope,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            topk_symbols: DEFAULT_TOPK,
            topk_stacks: DEFAULT_TOPK,
            order: RankOrder::Inclusive,
            filter: None,
            scope: ProcessScope::default(),
        }
    }
}

/// Percentage of `part` in `total`, rounded to 2 decimals
///
/// **Public** - shared by every report so rounding is uniform
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = (part as f64 / total as f64) * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Accumulate inclusive and leaf weight per symbol
///
/// **Public** - building block for rankings and shares
///
/// A frame repeated inside one stack (recursion) adds that stack's weight
/// to its inclusive total once.
pub fn symbol_stats(
    store: &FoldedStore,
    scope: &ProcessScope,
    filter: Option<&SymbolFilter>,
) -> Vec<SymbolStat> {
    let mut acc: HashMap<&str, (u64, u64)> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (stack, weight) in store.iter() {
        if !scope.matches(stack) {
            continue;
        }

        seen.clear();
        let mut leaf = None;
        for frame in split_frames(stack) {
            leaf = Some(frame);
            if !seen.insert(frame) {
                continue;
            }
            if filter.is_some_and(|f| !f.matches(frame)) {
                continue;
            }
            acc.entry(frame).or_insert((0, 0)).0 += weight;
        }

        if let Some(leaf) = leaf {
            if filter.map_or(true, |f| f.matches(leaf)) {
                acc.entry(leaf).or_insert((0, 0)).1 += weight;
            }
        }
    }

    acc.into_iter()
        .map(|(symbol, (inclusive, leaf))| SymbolStat {
            symbol: symbol.to_string(),
            inclusive,
            leaf,
        })
        .collect()
}

/// Sort symbol stats by `order` descending, ties by name ascending
pub fn rank_symbols(mut stats: Vec<SymbolStat>, order: RankOrder) -> Vec<SymbolStat> {
    stats.sort_by(|a, b| {
        order
            .key(b)
            .cmp(&order.key(a))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    stats
}

/// Top `k` symbols of a store
pub fn topk_symbols(
    store: &FoldedStore,
    k: usize,
    order: RankOrder,
    scope: &ProcessScope,
    filter: Option<&SymbolFilter>,
) -> Vec<SymbolStat> {
    if k == 0 {
        return Vec::new();
    }
    let mut ranked = rank_symbols(symbol_stats(store, scope, filter), order);
    ranked.truncate(k);
    ranked
}

/// Top `k` stacks of a store, heaviest first
pub fn topk_stacks(store: &FoldedStore, k: usize, scope: &ProcessScope) -> Vec<CollapsedStack> {
    if k == 0 {
        return Vec::new();
    }
    store
        .sorted_stacks()
        .into_iter()
        .filter(|s| scope.matches(&s.stack))
        .take(k)
        .collect()
}

/// Summarize a store into top symbols and top stacks
///
/// **Public** - main entry point for hotspot ranking
///
/// # Arguments
/// * `store` - Folded stacks to rank
/// * `options` - Top-K sizes, order, symbol filter and process scope
///
/// # Returns
/// Report with total weight and both rankings; an empty store yields
/// empty rankings and a zero total
pub fn summarize(store: &FoldedStore, options: &SummaryOptions) -> SummaryReport {
    let total = store.total_weight();
    debug!(
        "Summarizing {} stacks (total weight {}), top {} symbols by {}, top {} stacks",
        store.len(),
        total,
        options.topk_symbols,
        options.order,
        options.topk_stacks
    );

    let filter = options.filter.as_ref().filter(|f| !f.is_empty());

    let top_symbols = topk_symbols(store, options.topk_symbols, options.order, &options.scope, filter)
        .into_iter()
        .map(|s| create_symbol_share(s, total))
        .collect();

    let top_stacks = topk_stacks(store, options.topk_stacks, &options.scope)
        .iter()
        .map(|s| create_stack_share(s, total))
        .collect();

    SummaryReport {
        total_weight: total,
        top_symbols,
        top_stacks,
    }
}

/// Fraction (0.0..=1.0) of total weight attributed to `symbol`
pub fn symbol_share(store: &FoldedStore, symbol: &str, order: RankOrder) -> f64 {
    let total = store.total_weight();
    if total == 0 {
        return 0.0;
    }
    symbol_stats(store, &ProcessScope::default(), None)
        .iter()
        .find(|s| s.symbol == symbol)
        .map(|s| order.key(s) as f64 / total as f64)
        .unwrap_or(0.0)
}

/// Distribution of weight over the direct callees of `parent`
///
/// For every stack containing `...;parent;child;...` the stack weight goes
/// to `child` (once per stack); leaf weight when `child` is the sampled frame.
pub fn children_hotspots(store: &FoldedStore, parent: &str, order: RankOrder) -> Vec<SymbolStat> {
    let mut acc: HashMap<&str, (u64, u64)> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (stack, weight) in store.iter() {
        let frames: Vec<&str> = split_frames(stack).collect();
        seen.clear();
        for (i, pair) in frames.windows(2).enumerate() {
            if pair[0] != parent {
                continue;
            }
            let first_sight = seen.insert(pair[1]);
            let is_leaf = i + 2 == frames.len();
            if !first_sight && !is_leaf {
                continue;
            }
            let entry = acc.entry(pair[1]).or_insert((0, 0));
            if first_sight {
                entry.0 += weight;
            }
            if is_leaf {
                entry.1 += weight;
            }
        }
    }

    let stats = acc
        .into_iter()
        .map(|(symbol, (inclusive, leaf))| SymbolStat {
            symbol: symbol.to_string(),
            inclusive,
            leaf,
        })
        .collect();
    rank_symbols(stats, order)
}

/// Attach percentages to a symbol stat
///
/// **Public** - used by summarize and CSV export
pub fn create_symbol_share(stat: SymbolStat, total: u64) -> SymbolShare {
    SymbolShare {
        inclusive_pct: percentage(stat.inclusive, total),
        leaf_pct: percentage(stat.leaf, total),
        symbol: stat.symbol,
        inclusive: stat.inclusive,
        leaf: stat.leaf,
    }
}

/// Attach a percentage to a stack
pub fn create_stack_share(stack: &CollapsedStack, total: u64) -> StackShare {
    StackShare {
        stack: stack.stack.clone(),
        weight: stack.weight,
        weight_pct: percentage(stack.weight, total),
    }
}

/// Calculate weight distribution statistics
///
/// **Public** - provides summary statistics
pub fn calculate_weight_distribution(store: &FoldedStore) -> WeightDistribution {
    if store.is_empty() {
        return WeightDistribution::default();
    }

    let stacks = store.sorted_stacks();
    let total = store.total_weight();
    let count = stacks.len();
    let mean = total / count as u64;

    // sorted_stacks is descending, the median sits in the middle either way
    let median = stacks[count / 2].weight;

    // Top 10% of stacks
    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent_weight: u64 = stacks
        .iter()
        .take(top_10_percent_count)
        .map(|s| s.weight)
        .sum();

    WeightDistribution {
        total_weight: total,
        stack_count: count,
        mean_weight_per_stack: mean,
        median_weight_per_stack: median,
        top_10_percent_weight,
        top_10_percent_percentage: percentage(top_10_percent_weight, total),
    }
}

/// Weight distribution statistics
///
/// **Public** - returned from calculate_weight_distribution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightDistribution {
    /// Total weight across all stacks
    pub total_weight: u64,

    /// Number of unique stacks
    pub stack_count: usize,

    /// Mean weight per stack
    pub mean_weight_per_stack: u64,

    /// Median weight per stack
    pub median_weight_per_stack: u64,

    /// Weight held by the heaviest 10% of stacks
    pub top_10_percent_weight: u64,

    /// Percentage of total weight in the heaviest 10%
    pub top_10_percent_percentage: f64,
}

impl WeightDistribution {
    /// Returns true if top 10% of stacks hold more than 80% of the weight
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > CONCENTRATION_THRESHOLD_PERCENT
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} | Stacks: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_weight,
            self.stack_count,
            self.mean_weight_per_stack,
            self.median_weight_per_stack,
            self.top_10_percent_percentage
        )
    }
}
