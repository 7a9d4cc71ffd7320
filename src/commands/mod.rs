//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod calltree;
pub mod collapse;
pub mod models;
pub mod summarize;
pub mod utils;

// Re-export main command functions
pub use calltree::{execute_overhead, execute_paths, execute_tree};
pub use collapse::execute_collapse;
pub use models::{
    CalleesArgs, CollapseArgs, InputArgs, InputFormat, OutputArgs, OutputFormat, PathsArgs,
    SubsetArgs, SummarizeArgs, TreeArgs,
};
pub use summarize::{execute_callees, execute_subset, execute_summarize};
pub use utils::{display_schema, display_version, validate_report_file};
