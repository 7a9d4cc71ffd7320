use foldscope::aggregator::{
    children_hotspots, path_stats, subset, summarize, symbol_stats, ProcessScope, RankOrder,
    SummaryOptions,
};
use foldscope::calltree::{symbol_overhead, CallTrie};
use foldscope::output::{load_store, rows_to_csv_string, save_store};
use foldscope::parser::{collapse_lines, fold_lines, fold_text, CollapseOptions};
use foldscope::utils::AnalysisError;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

const BASIC: &str = "a;b;c 5\na;b;d 3\na;b;c 2";

const MIXED: &str = "\
java;main;run;alloc 40
java;main;run;compute 25
java;main;gc 10
bash;main;read 15
bash;main;main;read 5
python;eval;alloc 5";

#[test]
fn test_basic_fold() {
    let outcome = fold_text(BASIC).unwrap();
    assert_eq!(outcome.store.weight_of("a;b;c"), Some(7));
    assert_eq!(outcome.store.weight_of("a;b;d"), Some(3));
    assert_eq!(outcome.store.total_weight(), 10);
    assert_eq!(outcome.store.len(), 2);
    assert!(!outcome.is_partial());
}

#[test]
fn test_top_symbols_inclusive_and_leaf() {
    let store = fold_text(BASIC).unwrap().store;

    let report = summarize(&store, &SummaryOptions::default());
    let top: Vec<(&str, f64)> = report
        .top_symbols
        .iter()
        .take(2)
        .map(|s| (s.symbol.as_str(), s.inclusive_pct))
        .collect();
    assert_eq!(top, vec![("a", 100.0), ("b", 100.0)]);

    let options = SummaryOptions {
        order: RankOrder::Leaf,
        topk_symbols: 2,
        ..Default::default()
    };
    let report = summarize(&store, &options);
    let leaves: Vec<(&str, u64)> = report
        .top_symbols
        .iter()
        .map(|s| (s.symbol.as_str(), s.leaf))
        .collect();
    assert_eq!(leaves, vec![("c", 7), ("d", 3)]);
}

#[test]
fn test_exact_overhead_scenario() {
    let trie = CallTrie::from_folded_text(BASIC).unwrap();
    let report = symbol_overhead(&trie, "c", None, false).unwrap();

    assert_eq!(report.total_weight, 10);
    assert_eq!(report.results.len(), 1);
    let hit = &report.results[0];
    assert_eq!(hit.path, "a;b;c");
    assert_eq!((hit.inclusive, hit.leaf), (7, 7));
    assert_eq!(hit.inclusive_pct, 70.0);
}

#[test]
fn test_subset_scenarios() {
    let store = fold_text(BASIC).unwrap().store;

    let only_d = subset(&store, "d", None).unwrap();
    assert_eq!(only_d.to_lines(), vec!["a;b;d 3".to_string()]);
    let report = summarize(&only_d, &SummaryOptions::default());
    let d = report.top_symbols.iter().find(|s| s.symbol == "d").unwrap();
    assert_eq!(d.leaf_pct, 100.0);

    let none = subset(&store, "zzz", None).unwrap();
    assert_eq!(none.total_weight(), 0);
    let report = summarize(&none, &SummaryOptions::default());
    assert!(report.top_symbols.is_empty());
    assert!(report.top_stacks.is_empty());
}

#[test]
fn test_zero_valid_lines() {
    let err = fold_text("garbage\nmore garbage\n").unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::EmptyOrMalformedInput {
            lines_read: 2,
            skipped_lines: 2
        }
    ));
}

#[test]
fn test_weight_conservation() {
    let store = fold_text(MIXED).unwrap().store;
    let trie = CallTrie::from_store(&store);

    let leaf_sum: u64 = trie.leaf_paths().iter().map(|(_, w)| w).sum();
    assert_eq!(leaf_sum, store.total_weight());
    assert_eq!(trie.total_weight(), store.total_weight());

    let options = SummaryOptions {
        topk_stacks: usize::MAX,
        ..Default::default()
    };
    let stack_sum: u64 = summarize(&store, &options)
        .top_stacks
        .iter()
        .map(|s| s.weight)
        .sum();
    assert_eq!(stack_sum, store.total_weight());

    let path_sum: u64 = path_stats(&store, 0).paths.iter().map(|p| p.weight).sum();
    assert_eq!(path_sum, store.total_weight());
}

#[test]
fn test_trie_and_store_symbol_stats_agree() {
    let store = fold_text(MIXED).unwrap().store;
    let trie = CallTrie::from_store(&store);

    let mut from_store = symbol_stats(&store, &ProcessScope::default(), None);
    let mut from_trie = trie.symbol_stats();
    from_store.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    from_trie.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    assert_eq!(from_trie, from_store);

    for stat in &from_store {
        assert!(stat.inclusive >= stat.leaf, "{}", stat.symbol);
    }
}

#[test]
fn test_idempotent_folding() {
    let a = ["x;y 1", "x;z 2", "bad"];
    let b = ["x;y 4", "q 1"];

    let mut merged = fold_lines(a).unwrap().store;
    merged.merge(fold_lines(b).unwrap().store);

    let together = fold_lines(a.iter().chain(b.iter())).unwrap().store;
    assert_eq!(merged, together);
    assert_eq!(together.weight_of("x;y"), Some(5));
}

#[test]
fn test_percentages_in_range() {
    let store = fold_text(MIXED).unwrap().store;
    let options = SummaryOptions {
        topk_symbols: 0,
        topk_stacks: usize::MAX,
        ..Default::default()
    };
    let report = summarize(&store, &options);
    assert!(report.top_symbols.is_empty());
    for stack in &report.top_stacks {
        assert!((0.0..=100.0).contains(&stack.weight_pct));
    }

    let trie = CallTrie::from_store(&store);
    for hit in symbol_overhead(&trie, "a", None, true).unwrap().results {
        assert!((0.0..=100.0).contains(&hit.inclusive_pct));
        assert!(hit.leaf_pct <= hit.inclusive_pct);
    }
}

#[test]
fn test_ranking_ties_are_deterministic() {
    let text = "p;zeta 5\np;alpha 5\np;mid 5";
    let first = summarize(&fold_text(text).unwrap().store, &SummaryOptions::default());
    for _ in 0..5 {
        let again = summarize(&fold_text(text).unwrap().store, &SummaryOptions::default());
        assert_eq!(again, first);
    }
    let stacks: Vec<&str> = first.top_stacks.iter().map(|s| s.stack.as_str()).collect();
    assert_eq!(stacks, vec!["p;alpha", "p;mid", "p;zeta"]);
}

#[test]
fn test_shared_store_across_threads() {
    let store = Arc::new(fold_text(MIXED).unwrap().store);
    let trie = Arc::new(CallTrie::from_store(&store));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let trie = Arc::clone(&trie);
            thread::spawn(move || {
                let summary = summarize(&store, &SummaryOptions::default());
                let overhead = symbol_overhead(&trie, "alloc", None, false).unwrap();
                (summary, overhead)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (summary, overhead) in &results {
        assert_eq!(summary, &results[0].0);
        assert_eq!(overhead, &results[0].1);
        assert_eq!(overhead.results.len(), 2);
    }
}

#[test]
fn test_perf_script_to_queries() {
    let script = "\
# ========
# captured on: today
java 4021/4025 [003] 1813.421: 250000 cycles:
\t7f3e1c2a4b10 Interpreter::run+0x1c (/usr/lib/jvm/libjvm.so)
\t7f3e1c2a0042 JavaMain (/usr/lib/jvm/libjli.so)

java 4021/4026 [001] 1813.422: 250000 cycles:
\t7f3e1c2a4b10 Interpreter::run+0x1c (/usr/lib/jvm/libjvm.so)
\t7f3e1c2a0042 JavaMain (/usr/lib/jvm/libjli.so)

";
    let outcome = collapse_lines(script.lines(), &CollapseOptions::default()).unwrap();
    assert_eq!(
        outcome.store.to_lines(),
        vec!["java;JavaMain;Interpreter::run 2".to_string()]
    );

    let trie = CallTrie::from_store(&outcome.store);
    let hits = symbol_overhead(&trie, "Interpreter", None, true).unwrap();
    assert_eq!(hits.results[0].path, "java;JavaMain;Interpreter::run");
    assert_eq!(hits.results[0].leaf_pct, 100.0);
}

#[test]
fn test_persisted_store_round_trip() {
    let store = fold_text(MIXED).unwrap().store;
    let temp_dir = tempfile::tempdir().unwrap();

    let handle = save_store(&store, temp_dir.path().join("mixed.folded")).unwrap();
    let loaded = load_store(&handle).unwrap();
    assert_eq!(loaded, store);

    let before = summarize(&store, &SummaryOptions::default());
    let after = summarize(&loaded, &SummaryOptions::default());
    assert_eq!(before, after);
}

#[test]
fn test_saved_empty_subset_reloads() {
    let store = fold_text(BASIC).unwrap().store;
    let temp_dir = tempfile::tempdir().unwrap();

    let none = subset(&store, "zzz", None).unwrap();
    let handle = save_store(&none, temp_dir.path().join("none.folded")).unwrap();
    let loaded = load_store(&handle).unwrap();

    assert_eq!(loaded, none);
    assert_eq!(loaded.total_weight(), 0);
    assert!(summarize(&loaded, &SummaryOptions::default()).top_symbols.is_empty());
}

#[test]
fn test_overflowing_weight_is_skipped() {
    let outcome = fold_text("a 18446744073709551615\nb 1").unwrap();
    assert_eq!(outcome.store.total_weight(), u64::MAX);
    assert_eq!(outcome.skipped_lines, 1);
    assert!(outcome.is_partial());

    let trie = CallTrie::from_store(&outcome.store);
    assert_eq!(trie.total_weight(), u64::MAX);
    let report = summarize(&outcome.store, &SummaryOptions::default());
    assert_eq!(report.top_stacks[0].weight_pct, 100.0);
}

#[test]
fn test_recursive_callee_keeps_leaf_weight() {
    let store = fold_text("p;b;d;b;d 4").unwrap().store;
    let callees = children_hotspots(&store, "b", RankOrder::Leaf);
    assert_eq!(callees.len(), 1);
    assert_eq!(callees[0].symbol, "d");
    assert_eq!((callees[0].inclusive, callees[0].leaf), (4, 4));
}

#[test]
fn test_csv_of_stack_ranking() {
    let store = fold_text(BASIC).unwrap().store;
    let report = summarize(&store, &SummaryOptions::default());
    let csv = rows_to_csv_string(&report.top_stacks).unwrap();
    assert_eq!(
        csv,
        "stack,weight,weight_pct\na;b;c,7,70.0\na;b;d,3,30.0\n"
    );
}

#[test]
fn test_process_scope_restricts_rankings() {
    let store = fold_text(MIXED).unwrap().store;
    let options = SummaryOptions {
        scope: ProcessScope::new(None, Some("^ba")).unwrap(),
        ..Default::default()
    };
    let report = summarize(&store, &options);
    assert!(report.top_stacks.iter().all(|s| s.stack.starts_with("bash;")));
    assert_eq!(report.top_symbols[0].symbol, "bash");
    assert_eq!(report.top_symbols[0].inclusive, 20);
    // Shares stay relative to the whole profile
    assert_eq!(report.top_symbols[0].inclusive_pct, 20.0);
}
