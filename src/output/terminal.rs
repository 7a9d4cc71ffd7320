//! Terminal rendering of analysis reports.
//!
//! Produces fixed-width tables for humans; machine consumers should use the
//! JSON or CSV writers instead.

use crate::parser::schema::{OverheadReport, PathStatsReport, SummaryReport, TreeNode, TreeReport};
use colored::*;

const STACK_WIDTH: usize = 60;
const BAR_WIDTH: usize = 40;
const RULE: &str = "--------------------------------------------------------------------------------";

/// Render a summary report as symbol and stack tables
pub fn render_summary(report: &SummaryReport) -> String {
    let mut out = String::new();

    out.push_str(&render_header("Profile Summary", report.total_weight));

    out.push_str(&format!("\n{}\n", "Top Symbols".bold()));
    if report.top_symbols.is_empty() {
        out.push_str("  (none)\n");
    } else {
        out.push_str(&format!(
            "  {:<w$} {:>12} {:>8} {:>12} {:>8}\n",
            "SYMBOL",
            "INCLUSIVE",
            "%",
            "LEAF",
            "%",
            w = STACK_WIDTH
        ));
        for share in &report.top_symbols {
            out.push_str(&format!(
                "  {} {:>12} {} {:>12} {:>7.2}%\n",
                pad(&shorten(&share.symbol), STACK_WIDTH),
                share.inclusive,
                color_pct(share.inclusive_pct),
                share.leaf,
                share.leaf_pct
            ));
        }
    }

    out.push_str(&format!("\n{}\n", "Top Stacks".bold()));
    if report.top_stacks.is_empty() {
        out.push_str("  (none)\n");
    } else {
        for stack in &report.top_stacks {
            out.push_str(&format!(
                "  {} {:>12} {}\n",
                pad(&shorten(&stack.stack), STACK_WIDTH),
                stack.weight,
                color_pct(stack.weight_pct)
            ));
        }
    }

    out
}

/// Render overhead matches, heaviest first
pub fn render_overhead(report: &OverheadReport) -> String {
    let mut out = render_header("Symbol Overhead", report.total_weight);

    if report.results.is_empty() {
        out.push_str(&format!("{}\n", "No matching frames".yellow()));
        return out;
    }

    for entry in &report.results {
        out.push_str(&format!(
            "  {} {} incl {:>10} {} leaf {:>10} {:>7.2}%\n",
            entry.symbol.bold(),
            pad(&shorten(&entry.path), STACK_WIDTH),
            entry.inclusive,
            color_pct(entry.inclusive_pct),
            entry.leaf,
            entry.leaf_pct
        ));
    }
    out
}

/// Render weight per root frame as a bar chart
pub fn render_path_stats(report: &PathStatsReport) -> String {
    let mut out = render_header("Weight by Process", report.total_weight);

    for stat in &report.paths {
        let bar_len = ((stat.percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
        out.push_str(&format!(
            "  {} {:<bw$} {:>12} {}\n",
            pad(&shorten(&stat.path), 30),
            "█".repeat(bar_len.min(BAR_WIDTH)),
            stat.weight,
            color_pct(stat.percentage),
            bw = BAR_WIDTH
        ));
    }

    if report.truncated {
        out.push_str(&format!("   (Showing top {} processes)\n", report.paths.len()));
    }
    out
}

/// Render an exported forest as an indented tree
pub fn render_tree(report: &TreeReport) -> String {
    let mut out = render_header("Call Tree", report.total_weight);
    for tree in &report.trees {
        render_tree_node(tree, report.total_weight, 0, &mut out);
    }
    out
}

fn render_tree_node(node: &TreeNode, total: u64, indent: usize, out: &mut String) {
    let pct = crate::aggregator::percentage(node.count, total);
    out.push_str(&format!(
        "{}{} {} ({})\n",
        "  ".repeat(indent + 1),
        node.name,
        node.count,
        color_pct(pct)
    ));
    for child in &node.children {
        render_tree_node(child, total, indent + 1, out);
    }
}

fn render_header(title: &str, total_weight: u64) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&title.bold().to_string());
    out.push_str(&format!("\n{}\n", RULE));
    out.push_str(&format!("Total weight: {}\n", total_weight));
    out.push_str(&format!("{}\n", RULE));
    out
}

/// Hot shares in red, warm in yellow
fn color_pct(pct: f64) -> ColoredString {
    let text = format!("{:>7.2}%", pct);
    if pct >= 50.0 {
        text.red().bold()
    } else if pct >= 10.0 {
        text.yellow()
    } else {
        text.normal()
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// Keep the leaf end of long stacks
fn shorten(stack: &str) -> String {
    let chars = stack.chars().count();
    if chars <= STACK_WIDTH {
        return stack.to_string();
    }
    let tail: String = stack.chars().skip(chars - (STACK_WIDTH - 3)).collect();
    format!("...{}", tail)
}
