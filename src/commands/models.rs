use crate::aggregator::SymbolFilter;
use crate::parser::CollapseOptions;
use crate::utils::validate::QueryParams;
use clap::ValueEnum;
use std::path::PathBuf;

/// How the input stream is encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Folded stacks, one `a;b;c weight` per line
    #[default]
    Folded,

    /// Raw `perf script` output
    Perf,
}

/// How a report is printed when no output file is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,

    /// Human-readable table
    Table,
}

/// Where input comes from
///
/// **Public** - shared by every query command
#[derive(Debug, Clone)]
pub struct InputArgs {
    /// Input path (`-` for stdin)
    pub path: PathBuf,

    pub format: InputFormat,

    /// Folding options for perf script input (merged over the config file)
    pub collapse: CollapseOptions,
}

impl Default for InputArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("-"),
            format: InputFormat::Folded,
            collapse: CollapseOptions::default(),
        }
    }
}

/// Where and how the report goes
#[derive(Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the JSON report here instead of stdout
    pub path: Option<PathBuf>,

    pub format: OutputFormat,
}

/// Arguments for the collapse command
#[derive(Debug, Clone, Default)]
pub struct CollapseArgs {
    pub input: InputArgs,

    /// Preview lines kept in the report (0 = all)
    pub params: QueryParams,

    /// Persist the folded store here
    pub save: Option<PathBuf>,

    pub output: OutputArgs,
}

/// Arguments for the summarize command
#[derive(Debug, Clone, Default)]
pub struct SummarizeArgs {
    pub input: InputArgs,
    pub params: QueryParams,
    pub filter: SymbolFilter,

    /// Only stacks whose root frame starts with this
    pub proc_prefix: Option<String>,

    /// Only stacks whose root frame matches this regex
    pub proc_regex: Option<String>,

    pub symbols_csv: Option<PathBuf>,
    pub stacks_csv: Option<PathBuf>,
    pub output: OutputArgs,
}

/// Arguments for the subset command
#[derive(Debug, Clone, Default)]
pub struct SubsetArgs {
    pub input: InputArgs,

    /// `symbol` is required, `process_filter` optional
    pub params: QueryParams,

    /// Persist the subset store here
    pub save: Option<PathBuf>,

    pub output: OutputArgs,
}

/// Arguments for the callees command
#[derive(Debug, Clone, Default)]
pub struct CalleesArgs {
    pub input: InputArgs,

    /// `symbol` is the parent frame
    pub params: QueryParams,

    pub output: OutputArgs,
}

/// Arguments for the tree and overhead commands
#[derive(Debug, Clone, Default)]
pub struct TreeArgs {
    pub input: InputArgs,

    /// `symbol` (overhead) or `start_symbol` (tree), `fuzzy`, `depth`
    pub params: QueryParams,

    pub output: OutputArgs,
}

/// Arguments for the paths command
#[derive(Debug, Clone, Default)]
pub struct PathsArgs {
    pub input: InputArgs,

    /// `limit` on the number of processes (0 = all)
    pub params: QueryParams,

    pub output: OutputArgs,
}
