//! Weighted prefix trie over call-stack frames.
//!
//! Nodes live in a flat arena and refer to their children by index, so the
//! tree is owned by one `Vec` and never needs reference counting.
//! Index 0 is the root: the empty prefix, whose inclusive weight is the
//! total weight of every inserted stack.

use crate::aggregator::metrics::SymbolStat;
use crate::aggregator::store::{split_frames, FoldedStore};
use crate::parser::folded::{fold_file, fold_text};
use crate::utils::config::FRAME_SEPARATOR;
use crate::utils::error::AnalysisError;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

pub(crate) const ROOT: usize = 0;
const ROOT_NAME: &str = "root";

/// One frame position in the call tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieNode {
    pub name: String,

    /// Weight of every stack passing through this node
    pub inclusive: u64,

    /// Weight of stacks ending exactly here
    pub leaf: u64,

    pub parent: Option<usize>,

    /// Frames from the root, 1 for the outermost frame
    pub depth: usize,

    children: HashMap<String, usize>,
}

impl TrieNode {
    fn new(name: &str, parent: Option<usize>, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            inclusive: 0,
            leaf: 0,
            parent,
            depth,
            children: HashMap::new(),
        }
    }

    /// Child indices in arbitrary order
    pub fn child_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.values().copied()
    }

    pub fn child(&self, name: &str) -> Option<usize> {
        self.children.get(name).copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Call trie built from folded stacks
#[derive(Debug, Clone)]
pub struct CallTrie {
    nodes: Vec<TrieNode>,
}

impl Default for CallTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl CallTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::new(ROOT_NAME, None, 0)],
        }
    }

    /// Build a trie holding every stack of `store`
    pub fn from_store(store: &FoldedStore) -> Self {
        let mut trie = Self::new();
        for (stack, weight) in store.iter() {
            trie.insert(split_frames(stack), weight);
        }
        debug!(
            "Built call trie: {} nodes from {} stacks (total weight {})",
            trie.node_count(),
            store.len(),
            trie.total_weight()
        );
        trie
    }

    /// Build from folded text, skipping malformed lines like the folder does
    pub fn from_folded_text(text: &str) -> Result<Self, AnalysisError> {
        Ok(Self::from_store(&fold_text(text)?.store))
    }

    /// Build from a folded file (`-` for stdin)
    pub fn from_folded_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        Ok(Self::from_store(&fold_file(path)?.store))
    }

    /// Insert one stack (root first) with its weight
    ///
    /// Every node on the path gains `weight` inclusive; the last one also
    /// gains it as leaf weight. Counters saturate at `u64::MAX`. An empty
    /// stack is ignored.
    pub fn insert<'a, I>(&mut self, frames: I, weight: u64)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut idx = ROOT;
        let mut path_len = 0;
        for frame in frames {
            idx = self.child_or_insert(idx, frame);
            let node = &mut self.nodes[idx];
            node.inclusive = node.inclusive.saturating_add(weight);
            path_len += 1;
        }
        if path_len == 0 {
            return;
        }
        let leaf = &mut self.nodes[idx];
        leaf.leaf = leaf.leaf.saturating_add(weight);
        let root = &mut self.nodes[ROOT];
        root.inclusive = root.inclusive.saturating_add(weight);
    }

    fn child_or_insert(&mut self, parent: usize, name: &str) -> usize {
        if let Some(idx) = self.nodes[parent].child(name) {
            return idx;
        }
        let idx = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(TrieNode::new(name, Some(parent), depth));
        self.nodes[parent].children.insert(name.to_string(), idx);
        idx
    }

    /// Total weight of all inserted stacks
    pub fn total_weight(&self) -> u64 {
        self.nodes[ROOT].inclusive
    }

    /// Number of frame nodes (root excluded)
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn root(&self) -> &TrieNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, idx: usize) -> &TrieNode {
        &self.nodes[idx]
    }

    /// Frame nodes in arena order (root excluded)
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &TrieNode)> {
        self.nodes.iter().enumerate().skip(1)
    }

    /// Children of `idx`, heaviest first, ties by name ascending
    pub fn sorted_children(&self, idx: usize) -> Vec<usize> {
        let mut children: Vec<usize> = self.nodes[idx].child_indices().collect();
        children.sort_by(|&a, &b| self.heavier_first(a, b));
        children
    }

    pub(crate) fn heavier_first(&self, a: usize, b: usize) -> std::cmp::Ordering {
        let (na, nb) = (&self.nodes[a], &self.nodes[b]);
        nb.inclusive
            .cmp(&na.inclusive)
            .then_with(|| na.name.cmp(&nb.name))
    }

    /// Frame names from the outermost frame down to `idx`
    pub fn path(&self, idx: usize) -> Vec<&str> {
        let mut path = Vec::with_capacity(self.nodes[idx].depth);
        let mut cur = idx;
        while cur != ROOT {
            path.push(self.nodes[cur].name.as_str());
            cur = self.nodes[cur].parent.unwrap_or(ROOT);
        }
        path.reverse();
        path
    }

    /// Path of `idx` joined with the frame separator
    pub fn path_string(&self, idx: usize) -> String {
        self.path(idx).join(&FRAME_SEPARATOR.to_string())
    }

    /// Indices of every frame node whose name satisfies `predicate`, in
    /// depth-first order
    pub fn find_nodes<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&str) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.sorted_children(ROOT).into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            if predicate(&self.nodes[idx].name) {
                found.push(idx);
            }
            stack.extend(self.sorted_children(idx).into_iter().rev());
        }
        found
    }

    /// Every full stack with a non-zero leaf weight, heaviest first
    pub fn leaf_paths(&self) -> Vec<(String, u64)> {
        let mut paths: Vec<(String, u64)> = self
            .nodes()
            .filter(|(_, node)| node.leaf > 0)
            .map(|(idx, node)| (self.path_string(idx), node.leaf))
            .collect();
        paths.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        paths
    }

    /// Node weights aggregated by frame name
    ///
    /// A name nested under itself (recursion) contributes its inclusive
    /// weight only at the outermost occurrence, so each stack counts once.
    pub fn symbol_stats(&self) -> Vec<SymbolStat> {
        let mut acc: HashMap<&str, (u64, u64)> = HashMap::new();
        for (idx, node) in self.nodes() {
            let entry = acc.entry(node.name.as_str()).or_insert((0, 0));
            entry.1 = entry.1.saturating_add(node.leaf);
            if !self.has_ancestor_named(idx, &node.name) {
                entry.0 = entry.0.saturating_add(node.inclusive);
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

    fn has_ancestor_named(&self, idx: usize, name: &str) -> bool {
        let mut cur = self.nodes[idx].parent;
        while let Some(p) = cur {
            if p == ROOT {
                return false;
            }
            if self.nodes[p].name == name {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }
}
