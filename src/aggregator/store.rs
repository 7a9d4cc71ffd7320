//! In-memory folded stack store.
//!
//! Collapsed stacks are the shared input of every query.
//! Format: "root;caller;callee weight"
//!
//! Example: "python;main;json_dumps 1000"
//! This means: 1000 weighted samples had json_dumps innermost, called from main in python.

use crate::utils::config::FRAME_SEPARATOR;
use log::{debug, warn};
use std::collections::HashMap;

/// A single collapsed stack entry
///
/// **Public** - the record type handed out by rankings and filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Stack trace as semicolon-separated string, root first
    pub stack: String,

    /// Accumulated sample weight
    pub weight: u64,
}

impl CollapsedStack {
    /// Create a new collapsed stack
    ///
    /// **Public** - constructor
    pub fn new(stack: String, weight: u64) -> Self {
        Self { stack, weight }
    }

    /// Frames from root to leaf
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        split_frames(&self.stack)
    }

    /// Outermost frame (process/thread identity for profiler output)
    pub fn root(&self) -> &str {
        root_frame(&self.stack)
    }

    /// Innermost sampled frame
    pub fn leaf(&self) -> &str {
        self.stack
            .rsplit(FRAME_SEPARATOR)
            .next()
            .unwrap_or(&self.stack)
    }

    /// Render back to a folded line
    pub fn to_line(&self) -> String {
        format!("{} {}", self.stack, self.weight)
    }
}

/// Split a folded key into its frames
pub fn split_frames(stack: &str) -> impl Iterator<Item = &str> {
    stack.split(FRAME_SEPARATOR)
}

/// First frame of a folded key
pub fn root_frame(stack: &str) -> &str {
    stack.split(FRAME_SEPARATOR).next().unwrap_or(stack)
}

/// Mapping from folded stack key to accumulated weight
///
/// Each distinct stack appears once; repeated observations add weight.
/// `total_weight` is kept in step with every insert so percentage math
/// never re-sums the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldedStore {
    stacks: HashMap<String, u64>,
    total_weight: u64,
}

impl FoldedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weight to a stack, creating it on first sight
    ///
    /// Returns `false`, leaving the store untouched, when the total weight
    /// would overflow `u64`. A stack weight never exceeds the total, so
    /// checking the total covers both counters.
    pub fn insert(&mut self, stack: impl Into<String>, weight: u64) -> bool {
        let Some(total) = self.total_weight.checked_add(weight) else {
            return false;
        };
        *self.stacks.entry(stack.into()).or_insert(0) += weight;
        self.total_weight = total;
        true
    }

    /// Add weight to the stack made of `frames` (root first)
    ///
    /// Same overflow contract as [`FoldedStore::insert`].
    pub fn insert_frames<S: AsRef<str>>(&mut self, frames: &[S], weight: u64) -> bool {
        let mut key = String::new();
        for (i, frame) in frames.iter().enumerate() {
            if i > 0 {
                key.push(FRAME_SEPARATOR);
            }
            key.push_str(frame.as_ref());
        }
        self.insert(key, weight)
    }

    /// Fold another store into this one
    ///
    /// Stacks whose weight would overflow the total are dropped with a
    /// warning; the count of dropped stacks is returned.
    pub fn merge(&mut self, other: FoldedStore) -> usize {
        debug!("Merging {} stacks into store of {}", other.len(), self.len());
        let mut dropped = 0;
        for (stack, weight) in other.stacks {
            if !self.insert(stack.as_str(), weight) {
                warn!("Dropping stack {:?} ({}): total weight overflow", stack, weight);
                dropped += 1;
            }
        }
        dropped
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Number of unique stacks
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Weight recorded for an exact stack key
    pub fn weight_of(&self, stack: &str) -> Option<u64> {
        self.stacks.get(stack).copied()
    }

    /// Iterate `(stack, weight)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.stacks.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// All stacks, heaviest first, ties by stack string ascending
    ///
    /// **Public** - used by rankings and distribution statistics
    pub fn sorted_stacks(&self) -> Vec<CollapsedStack> {
        let mut stacks: Vec<CollapsedStack> = self
            .iter()
            .map(|(stack, weight)| CollapsedStack::new(stack.to_string(), weight))
            .collect();

        stacks.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.stack.cmp(&b.stack)));
        stacks
    }

    /// Folded text lines, sorted by stack key
    pub fn to_lines(&self) -> Vec<String> {
        let mut keys: Vec<&String> = self.stacks.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|k| format!("{} {}", k, self.stacks[k]))
            .collect()
    }
}

impl FromIterator<(String, u64)> for FoldedStore {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut store = FoldedStore::new();
        for (stack, weight) in iter {
            if !store.insert(stack.as_str(), weight) {
                warn!("Dropping stack {:?} ({}): total weight overflow", stack, weight);
            }
        }
        store
    }
}
