//! foldscope CLI
//!
//! Stack-trace profile analysis: folds samples, ranks hot symbols and
//! stacks, and exports call trees.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

use foldscope::aggregator::SymbolFilter;
use foldscope::commands::{
    display_schema, display_version, execute_callees, execute_collapse, execute_overhead,
    execute_paths, execute_subset, execute_summarize, execute_tree, validate_report_file,
    CalleesArgs, CollapseArgs, InputArgs, InputFormat, OutputArgs, OutputFormat, PathsArgs,
    SubsetArgs, SummarizeArgs, TreeArgs,
};
use foldscope::parser::CollapseOptions;
use foldscope::utils::config::{load_config, AnalysisConfig};
use foldscope::utils::QueryParams;

/// foldscope - stack-trace profile analysis
#[derive(Parser, Debug)]
#[command(name = "foldscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with query defaults
    #[arg(long, global = true, env = "FOLDSCOPE_CONFIG")]
    config: Option<PathBuf>,
}

/// Input options shared by every query
#[derive(Args, Debug)]
struct InputOpts {
    /// Input file (`-` for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Input encoding
    #[arg(long, value_enum, default_value_t = InputFormat::Folded)]
    format: InputFormat,

    /// perf script: append the PID to the process frame
    #[arg(long)]
    pid: bool,

    /// perf script: append PID/TID to the process frame
    #[arg(long)]
    tid: bool,

    /// perf script: annotate kernel frames with _[k]
    #[arg(long)]
    kernel: bool,

    /// perf script: annotate JIT frames with _[j]
    #[arg(long)]
    jit: bool,

    /// perf script: annotate kernel and JIT frames
    #[arg(long)]
    all: bool,

    /// perf script: keep addresses and offsets
    #[arg(long)]
    addrs: bool,

    /// perf script: only fold this event
    #[arg(long, default_value = "")]
    event_filter: String,

    /// perf script: weight samples by their period
    #[arg(long)]
    period_weights: bool,
}

impl From<InputOpts> for InputArgs {
    fn from(opts: InputOpts) -> Self {
        InputArgs {
            path: opts.input,
            format: opts.format,
            collapse: CollapseOptions {
                include_pid: opts.pid,
                include_tid: opts.tid,
                kernel: opts.kernel,
                jit: opts.jit,
                annotate_all: opts.all,
                addrs: opts.addrs,
                event_filter: opts.event_filter,
                period_weights: opts.period_weights,
            },
        }
    }
}

/// Report destination
#[derive(Args, Debug)]
struct OutputOpts {
    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stdout format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    print: OutputFormat,
}

impl From<OutputOpts> for OutputArgs {
    fn from(opts: OutputOpts) -> Self {
        OutputArgs {
            path: opts.output,
            format: opts.print,
        }
    }
}

/// Ranking options
#[derive(Args, Debug)]
struct RankOpts {
    /// Number of top symbols
    #[arg(long, allow_negative_numbers = true)]
    topk_symbols: Option<i64>,

    /// Number of top stacks
    #[arg(long, allow_negative_numbers = true)]
    topk_stacks: Option<i64>,

    /// Ranking order: inclusive or leaf
    #[arg(long)]
    order: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fold raw stacks and report the result
    Collapse {
        #[command(flatten)]
        input: InputOpts,

        /// Folded lines shown in the report (0 = all)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Save the folded stacks to this file
        #[arg(long)]
        save: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Rank hot symbols and stacks
    Summarize {
        #[command(flatten)]
        input: InputOpts,

        #[command(flatten)]
        rank: RankOpts,

        /// Only rank symbols starting with this (repeatable)
        #[arg(long)]
        include_prefix: Vec<String>,

        /// Only rank symbols ending with this (repeatable)
        #[arg(long)]
        include_suffix: Vec<String>,

        /// Never rank symbols starting with this (repeatable)
        #[arg(long)]
        exclude_prefix: Vec<String>,

        /// Never rank symbols ending with this (repeatable)
        #[arg(long)]
        exclude_suffix: Vec<String>,

        /// Only stacks whose process frame starts with this
        #[arg(long)]
        proc_prefix: Option<String>,

        /// Only stacks whose process frame matches this regex
        #[arg(long)]
        proc_regex: Option<String>,

        /// Also write the symbol ranking as CSV
        #[arg(long)]
        symbols_csv: Option<PathBuf>,

        /// Also write the stack ranking as CSV
        #[arg(long)]
        stacks_csv: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Rank only the stacks containing a symbol
    Subset {
        #[command(flatten)]
        input: InputOpts,

        /// Frame the stacks must contain
        #[arg(short, long)]
        symbol: String,

        /// Process (root) frame the stacks must start with
        #[arg(long)]
        process: Option<String>,

        #[command(flatten)]
        rank: RankOpts,

        /// Save the subset stacks to this file
        #[arg(long)]
        save: Option<PathBuf>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Rank the direct callees of a symbol
    Callees {
        #[command(flatten)]
        input: InputOpts,

        /// Parent frame
        #[arg(short, long)]
        symbol: String,

        #[command(flatten)]
        rank: RankOpts,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Weight carried by every call path reaching a symbol
    Overhead {
        #[command(flatten)]
        input: InputOpts,

        /// Frame to look for
        #[arg(short, long)]
        symbol: String,

        /// Match as a substring
        #[arg(long)]
        fuzzy: bool,

        /// Only matches within this many frames of the root
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i64>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Export the weight-sorted call tree
    Tree {
        #[command(flatten)]
        input: InputOpts,

        /// Start from every frame with this name
        #[arg(long)]
        start: Option<String>,

        /// Match the start frame as a substring
        #[arg(long)]
        fuzzy: bool,

        /// Levels kept below each exported root
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i64>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Weight per process (root frame)
    Paths {
        #[command(flatten)]
        input: InputOpts,

        /// Maximum number of processes (0 = all)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        #[command(flatten)]
        output: OutputOpts,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn rank_params(rank: RankOpts) -> QueryParams {
    QueryParams {
        topk_symbols: rank.topk_symbols,
        topk_stacks: rank.topk_stacks,
        order: rank.order,
        ..Default::default()
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    debug!("Using config: {:?}", config);

    // Execute command
    match cli.command {
        Commands::Collapse {
            input,
            limit,
            save,
            output,
        } => {
            let args = CollapseArgs {
                input: input.into(),
                params: QueryParams {
                    limit,
                    ..Default::default()
                },
                save,
                output: output.into(),
            };
            execute_collapse(args, &config)?;
        }

        Commands::Summarize {
            input,
            rank,
            include_prefix,
            include_suffix,
            exclude_prefix,
            exclude_suffix,
            proc_prefix,
            proc_regex,
            symbols_csv,
            stacks_csv,
            output,
        } => {
            let args = SummarizeArgs {
                input: input.into(),
                params: rank_params(rank),
                filter: SymbolFilter {
                    include_prefixes: include_prefix,
                    include_suffixes: include_suffix,
                    exclude_prefixes: exclude_prefix,
                    exclude_suffixes: exclude_suffix,
                },
                proc_prefix,
                proc_regex,
                symbols_csv,
                stacks_csv,
                output: output.into(),
            };
            execute_summarize(args, &config)?;
        }

        Commands::Subset {
            input,
            symbol,
            process,
            rank,
            save,
            output,
        } => {
            let args = SubsetArgs {
                input: input.into(),
                params: QueryParams {
                    symbol: Some(symbol),
                    process_filter: process,
                    ..rank_params(rank)
                },
                save,
                output: output.into(),
            };
            execute_subset(args, &config)?;
        }

        Commands::Callees {
            input,
            symbol,
            rank,
            output,
        } => {
            let args = CalleesArgs {
                input: input.into(),
                params: QueryParams {
                    symbol: Some(symbol),
                    ..rank_params(rank)
                },
                output: output.into(),
            };
            execute_callees(args, &config)?;
        }

        Commands::Overhead {
            input,
            symbol,
            fuzzy,
            depth,
            output,
        } => {
            let args = TreeArgs {
                input: input.into(),
                params: QueryParams {
                    symbol: Some(symbol),
                    fuzzy,
                    depth,
                    ..Default::default()
                },
                output: output.into(),
            };
            execute_overhead(args, &config)?;
        }

        Commands::Tree {
            input,
            start,
            fuzzy,
            depth,
            output,
        } => {
            let args = TreeArgs {
                input: input.into(),
                params: QueryParams {
                    start_symbol: start,
                    fuzzy,
                    depth,
                    ..Default::default()
                },
                output: output.into(),
            };
            execute_tree(args, &config)?;
        }

        Commands::Paths {
            input,
            limit,
            output,
        } => {
            let args = PathsArgs {
                input: input.into(),
                params: QueryParams {
                    limit,
                    ..Default::default()
                },
                output: output.into(),
            };
            execute_paths(args, &config)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
