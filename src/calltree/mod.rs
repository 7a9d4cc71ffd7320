//! Call-tree construction and queries.
//!
//! This module aggregates folded stacks into a prefix trie and answers:
//! - Weight-sorted tree exports (optionally from a start symbol)
//! - Exact or fuzzy symbol overhead lookups

pub mod query;
pub mod trie;

// Re-export main types
pub use query::{export_tree, symbol_overhead};
pub use trie::{CallTrie, TrieNode};
