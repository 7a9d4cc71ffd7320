//! Stack folding and report schema definitions.
//!
//! This module handles:
//! - Parsing folded stack text ("a;b;c 42")
//! - Collapsing `perf script` sample blocks into folded stacks
//! - Streaming input from files or stdin
//! - Defining the output schema

pub mod folded;
pub mod perf_script;
pub mod schema;
pub mod source;

// Re-export main types
pub use folded::{fold_file, fold_lines, fold_reader, fold_text, parse_folded_line, FoldOutcome};
pub use perf_script::{collapse_file, collapse_lines, collapse_reader, CollapseOptions};
pub use schema::{
    CalleesReport, CollapseReport, OverheadEntry, OverheadReport, PathStat, PathStatsReport, ReportEnvelope,
    StackShare, SummaryReport, SymbolShare, TreeNode, TreeReport,
};
