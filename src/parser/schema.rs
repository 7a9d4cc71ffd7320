//! Output JSON schema definitions for query results.
//!
//! This module defines the structure of every report we return or write to disk.
//! Files are wrapped in a versioned envelope to allow future evolution.

use serde::{Deserialize, Serialize};

/// Versioned wrapper written around every report file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope<T> {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Query that produced the report (e.g. "summarize")
    pub command: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    pub report: T,
}

/// Weight attributed to one symbol, with shares of the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolShare {
    pub symbol: String,
    pub inclusive: u64,
    pub leaf: u64,
    pub inclusive_pct: f64,
    pub leaf_pct: f64,
}

/// A ranked full stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackShare {
    /// Collapsed stack representation (e.g., "proc;main;leaf")
    pub stack: String,
    pub weight: u64,
    pub weight_pct: f64,
}

/// Result of a summarize query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_weight: u64,
    pub top_symbols: Vec<SymbolShare>,
    pub top_stacks: Vec<StackShare>,
}

/// One exported call-tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,

    /// Inclusive weight
    pub count: u64,

    /// Weight of samples ending at this node
    pub leaf_count: u64,

    /// Heaviest child first
    pub children: Vec<TreeNode>,
}

/// Result of a call-tree export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeReport {
    pub total_weight: u64,
    pub trees: Vec<TreeNode>,
}

/// One node matched by a symbol overhead query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadEntry {
    /// Name of the matched frame
    pub symbol: String,

    /// Frames from the root to the matched node, `;`-joined
    pub path: String,

    pub inclusive: u64,
    pub leaf: u64,
    pub inclusive_pct: f64,
    pub leaf_pct: f64,
}

/// Result of a symbol overhead query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadReport {
    pub total_weight: u64,
    pub results: Vec<OverheadEntry>,
}

/// Weight aggregated under one root frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStat {
    pub path: String,
    pub weight: u64,
    pub percentage: f64,
}

/// Result of a path stats query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStatsReport {
    pub total_weight: u64,
    pub paths: Vec<PathStat>,
    pub truncated: bool,
}

/// Direct callees of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalleesReport {
    pub parent: String,
    pub total_weight: u64,

    /// Share of the total held by the parent itself, ranked field
    pub parent_pct: f64,

    pub callees: Vec<SymbolShare>,
}

/// Metadata produced by folding an input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseReport {
    pub total_weight: u64,
    pub unique_stacks: usize,

    /// Lines consumed from the input, blank lines included
    pub lines_read: usize,

    /// Lines that could not be parsed and were skipped
    pub skipped_lines: usize,

    /// Sorted folded lines, possibly cut to the preview limit
    pub lines: Vec<String>,

    /// True when `lines` was cut
    pub truncated: bool,

    /// Where the folded store was persisted, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}
