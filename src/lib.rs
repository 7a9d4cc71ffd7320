//! foldscope
//!
//! Analysis of stack-trace profiles: folding raw samples into weighted
//! stacks, Top-K symbol and stack rankings, call-tree export and symbol
//! overhead queries.
//!
//! This crate provides the core implementation for the `foldscope` CLI.
//!
//! ## Getting Started
//!
//! ```bash
//! perf script | foldscope collapse --format perf --save app.folded -
//! foldscope summarize --order leaf app.folded
//! foldscope overhead --symbol malloc --fuzzy app.folded
//! ```
//!
//! As a library:
//!
//! ```ignore
//! let outcome = foldscope::parser::fold_file("app.folded")?;
//! let report = foldscope::aggregator::summarize(&outcome.store, &Default::default());
//! let trie = foldscope::calltree::CallTrie::from_store(&outcome.store);
//! let overhead = foldscope::calltree::symbol_overhead(&trie, "malloc", None, true)?;
//! ```

pub mod aggregator;
pub mod calltree;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
