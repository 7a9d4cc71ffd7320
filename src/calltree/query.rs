//! Call-tree export and symbol overhead queries.
//!
//! Both queries match frame names either exactly or by substring
//! (`fuzzy`), case-sensitive in both modes. Results are ordered heaviest
//! first so the hottest path is always presented first.

use super::trie::{CallTrie, ROOT};
use crate::aggregator::metrics::percentage;
use crate::parser::schema::{OverheadEntry, OverheadReport, TreeNode, TreeReport};
use crate::utils::error::AnalysisError;
use log::debug;

fn name_matches(name: &str, symbol: &str, fuzzy: bool) -> bool {
    if fuzzy {
        name.contains(symbol)
    } else {
        name == symbol
    }
}

impl CallTrie {
    /// Export the tree below `idx`, cut `depth_left` levels down
    fn build_tree(&self, idx: usize, depth_left: Option<usize>) -> TreeNode {
        let node = self.node(idx);
        let children = match depth_left {
            Some(0) => Vec::new(),
            _ => {
                let next = depth_left.map(|d| d - 1);
                self.sorted_children(idx)
                    .into_iter()
                    .map(|child| self.build_tree(child, next))
                    .collect()
            }
        };

        TreeNode {
            name: node.name.clone(),
            count: node.inclusive,
            leaf_count: node.leaf,
            children,
        }
    }

    /// Export a weight-sorted forest
    ///
    /// **Public** - main entry point for call-tree export
    ///
    /// # Arguments
    /// * `start_symbol` - Export from every node matching this name; `None`
    ///   exports from the root's children
    /// * `fuzzy` - Match `start_symbol` as a substring
    /// * `depth` - Levels kept below each export root (`Some(0)` keeps the
    ///   export root alone)
    ///
    /// # Returns
    /// Export roots and all children sorted by count descending then name
    /// ascending. No match yields an empty forest.
    pub fn export(&self, start_symbol: Option<&str>, fuzzy: bool, depth: Option<usize>) -> Vec<TreeNode> {
        let roots = match start_symbol {
            None => self.sorted_children(ROOT),
            Some(symbol) => {
                let mut matches = self.find_nodes(|name| name_matches(name, symbol, fuzzy));
                matches.sort_by(|&a, &b| {
                    self.heavier_first(a, b)
                        .then_with(|| self.path(a).cmp(&self.path(b)))
                });
                matches
            }
        };

        debug!("Exporting {} tree(s), depth limit {:?}", roots.len(), depth);

        roots
            .into_iter()
            .map(|idx| self.build_tree(idx, depth))
            .collect()
    }

    /// Weight carried by every node matching `symbol`
    ///
    /// **Public** - main entry point for symbol overhead queries
    ///
    /// # Arguments
    /// * `symbol` - Frame name, or substring when `fuzzy`
    /// * `depth` - Only report matches at most this many frames from the
    ///   root (1 = outermost frame)
    /// * `fuzzy` - Substring instead of exact match
    ///
    /// # Returns
    /// One entry per matching node, inclusive descending then path
    /// ascending; percentages are against the trie total
    ///
    /// # Errors
    /// * `AnalysisError::InvalidParameter` - Empty symbol
    pub fn symbol_overhead(
        &self,
        symbol: &str,
        depth: Option<usize>,
        fuzzy: bool,
    ) -> Result<Vec<OverheadEntry>, AnalysisError> {
        if symbol.is_empty() {
            return Err(AnalysisError::invalid("symbol is required"));
        }

        let total = self.total_weight();
        let mut results: Vec<OverheadEntry> = self
            .find_nodes(|name| name_matches(name, symbol, fuzzy))
            .into_iter()
            .filter(|&idx| depth.map_or(true, |d| self.node(idx).depth <= d))
            .map(|idx| {
                let node = self.node(idx);
                OverheadEntry {
                    symbol: node.name.clone(),
                    path: self.path_string(idx),
                    inclusive: node.inclusive,
                    leaf: node.leaf,
                    inclusive_pct: percentage(node.inclusive, total),
                    leaf_pct: percentage(node.leaf, total),
                }
            })
            .collect();

        results.sort_by(|a, b| b.inclusive.cmp(&a.inclusive).then_with(|| a.path.cmp(&b.path)));

        debug!(
            "Symbol '{}' (fuzzy={}) matched {} node(s)",
            symbol,
            fuzzy,
            results.len()
        );

        Ok(results)
    }
}

/// Export a call tree report
pub fn export_tree(
    trie: &CallTrie,
    start_symbol: Option<&str>,
    fuzzy: bool,
    depth: Option<usize>,
) -> TreeReport {
    TreeReport {
        total_weight: trie.total_weight(),
        trees: trie.export(start_symbol, fuzzy, depth),
    }
}

/// Build a symbol overhead report
pub fn symbol_overhead(
    trie: &CallTrie,
    symbol: &str,
    depth: Option<usize>,
    fuzzy: bool,
) -> Result<OverheadReport, AnalysisError> {
    Ok(OverheadReport {
        total_weight: trie.total_weight(),
        results: trie.symbol_overhead(symbol, depth, fuzzy)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trie() -> CallTrie {
        CallTrie::from_folded_text("a;b;c 5\na;b;d 3\na;b;c 2\nx;c 1").unwrap()
    }

    fn leaf(name: &str, count: u64) -> TreeNode {
        TreeNode {
            name: name.to_string(),
            count,
            leaf_count: count,
            children: vec![],
        }
    }

    #[test]
    fn test_export_full_forest() {
        let trees = trie().export(None, false, None);
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].name, "a");
        assert_eq!(trees[0].count, 10);
        assert_eq!(trees[1], TreeNode {
            name: "x".to_string(),
            count: 1,
            leaf_count: 0,
            children: vec![leaf("c", 1)],
        });

        let b = &trees[0].children[0];
        assert_eq!(b.children, vec![leaf("c", 7), leaf("d", 3)]);
    }

    #[test]
    fn test_export_depth_limit() {
        let trees = trie().export(None, false, Some(1));
        assert_eq!(trees[0].children.len(), 1);
        assert!(trees[0].children[0].children.is_empty());

        let trees = trie().export(None, false, Some(0));
        assert!(trees.iter().all(|t| t.children.is_empty()));
    }

    #[test]
    fn test_export_from_start_symbol() {
        let trees = trie().export(Some("c"), false, None);
        let roots: Vec<(&str, u64)> = trees.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(roots, vec![("c", 7), ("c", 1)]);

        let trees = trie().export(Some("b"), false, Some(1));
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].children.len(), 2);

        assert!(trie().export(Some("B"), false, None).is_empty());
        assert_eq!(trie().export(Some("B"), true, None).len(), 0);
        assert_eq!(trie().export(Some(""), true, Some(0)).len(), 6);
    }

    #[test]
    fn test_symbol_overhead_exact() {
        let results = trie().symbol_overhead("c", None, false).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].path, "a;b;c");
        assert_eq!(results[0].inclusive, 7);
        assert_eq!(results[0].leaf, 7);
        assert_eq!(results[0].inclusive_pct, 63.64);
        assert_eq!(results[1].path, "x;c");
    }

    #[test]
    fn test_symbol_overhead_depth_and_fuzzy() {
        let trie = CallTrie::from_folded_text("main;alloc_small 4\nmain;run;alloc_big 6").unwrap();

        let results = trie.symbol_overhead("alloc", None, true).unwrap();
        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["main;run;alloc_big", "main;alloc_small"]);

        let results = trie.symbol_overhead("alloc", Some(2), true).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "alloc_small");

        assert!(trie.symbol_overhead("alloc", None, false).unwrap().is_empty());
        assert!(trie.symbol_overhead("Alloc", None, true).unwrap().is_empty());
    }

    #[test]
    fn test_symbol_overhead_no_match_keeps_total() {
        let report = symbol_overhead(&trie(), "nothing", None, false).unwrap();
        assert_eq!(report.total_weight, 11);
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_symbol_overhead_empty_symbol() {
        assert!(matches!(
            trie().symbol_overhead("", None, true),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
