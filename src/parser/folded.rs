//! Folded stack text parser.
//!
//! Each line: "root;f1;f2;...;leaf <weight>". The weight is the last
//! whitespace-separated token, so frame names may contain spaces
//! ("python 1234;main").

use super::schema::CollapseReport;
use super::source::{for_each_line, open_source};
use crate::aggregator::store::FoldedStore;
use crate::utils::error::AnalysisError;
use log::{debug, warn};
use std::io::BufRead;
use std::path::Path;

// Only the first few malformed lines are logged one by one
const MAX_SKIP_WARNINGS: usize = 5;

/// A folded store together with the bookkeeping of how it was built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldOutcome {
    pub store: FoldedStore,

    /// Lines consumed, blank lines included
    pub lines_read: usize,

    /// Lines skipped because they did not parse or would overflow the total
    pub skipped_lines: usize,
}

impl FoldOutcome {
    /// True when some lines were dropped (a non-fatal partial parse)
    pub fn is_partial(&self) -> bool {
        self.skipped_lines > 0
    }

    /// Build the collapse report, listing at most `limit` lines (0 = all)
    pub fn report(&self, limit: usize) -> CollapseReport {
        let mut lines = self.store.to_lines();
        let truncated = limit > 0 && lines.len() > limit;
        if truncated {
            lines.truncate(limit);
        }

        CollapseReport {
            total_weight: self.store.total_weight(),
            unique_stacks: self.store.len(),
            lines_read: self.lines_read,
            skipped_lines: self.skipped_lines,
            lines,
            truncated,
            output: None,
        }
    }

    /// Fail when nothing usable came out of the input
    pub(crate) fn require_records(self) -> Result<Self, AnalysisError> {
        if self.store.is_empty() {
            return Err(AnalysisError::EmptyOrMalformedInput {
                lines_read: self.lines_read,
                skipped_lines: self.skipped_lines,
            });
        }
        if self.is_partial() {
            warn!(
                "Skipped {} malformed line(s) of {}",
                self.skipped_lines, self.lines_read
            );
        }
        debug!(
            "Folded {} lines into {} unique stacks (total weight {})",
            self.lines_read,
            self.store.len(),
            self.store.total_weight()
        );
        Ok(self)
    }
}

/// Split one folded line into its stack key and weight
///
/// **Public** - also used when validating persisted stores
///
/// Returns `None` for malformed lines: no weight token, a weight that is
/// not a non-negative integer, or an empty stack.
pub fn parse_folded_line(line: &str) -> Option<(&str, u64)> {
    let line = line.trim();
    let (stack, weight) = line.rsplit_once(|c: char| c.is_whitespace())?;
    let weight = weight.parse::<u64>().ok()?;
    let stack = stack.trim_end();
    if stack.is_empty() {
        return None;
    }
    Some((stack, weight))
}

/// Accumulates folded lines into a store
#[derive(Default)]
struct LineFolder {
    outcome: FoldOutcome,
}

impl LineFolder {
    fn push(&mut self, line: &str) {
        self.outcome.lines_read += 1;
        if line.trim().is_empty() {
            return;
        }

        let reason = match parse_folded_line(line) {
            Some((stack, weight)) => {
                if self.outcome.store.insert(stack, weight) {
                    return;
                }
                "weight overflows the total"
            }
            None => "malformed",
        };
        self.outcome.skipped_lines += 1;
        if self.outcome.skipped_lines <= MAX_SKIP_WARNINGS {
            warn!(
                "Skipping folded line {} ({}): {:?}",
                self.outcome.lines_read, reason, line
            );
        }
    }

    fn finish(self) -> Result<FoldOutcome, AnalysisError> {
        self.outcome.require_records()
    }
}

/// Fold a saved store, where an empty file is a valid empty store
///
/// Only a file with lines but no parsable record is rejected.
///
/// # Errors
/// * `AnalysisError::SourceUnavailable` - File cannot be opened or read
/// * `AnalysisError::EmptyOrMalformedInput` - Every non-blank line was skipped
pub(crate) fn fold_snapshot(path: &Path) -> Result<FoldOutcome, AnalysisError> {
    let mut folder = LineFolder::default();
    for_each_line(open_source(path)?, path, |line| folder.push(line))?;

    let outcome = folder.outcome;
    if outcome.store.is_empty() && outcome.is_partial() {
        return Err(AnalysisError::EmptyOrMalformedInput {
            lines_read: outcome.lines_read,
            skipped_lines: outcome.skipped_lines,
        });
    }
    if outcome.is_partial() {
        warn!(
            "Skipped {} malformed line(s) of {} in {}",
            outcome.skipped_lines,
            outcome.lines_read,
            path.display()
        );
    }
    Ok(outcome)
}

/// Fold already-split lines
///
/// **Public** - main entry point for in-memory folded text
///
/// # Errors
/// * `AnalysisError::EmptyOrMalformedInput` - No line produced a stack
pub fn fold_lines<I, S>(lines: I) -> Result<FoldOutcome, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut folder = LineFolder::default();
    for line in lines {
        folder.push(line.as_ref());
    }
    folder.finish()
}

/// Fold a text payload
pub fn fold_text(text: &str) -> Result<FoldOutcome, AnalysisError> {
    fold_lines(text.lines())
}

/// Fold a streamed reader; `source` names it in errors
pub fn fold_reader<R: BufRead>(reader: R, source: &Path) -> Result<FoldOutcome, AnalysisError> {
    let mut folder = LineFolder::default();
    for_each_line(reader, source, |line| folder.push(line))?;
    folder.finish()
}

/// Fold a folded-stack file (`-` for stdin)
///
/// # Errors
/// * `AnalysisError::SourceUnavailable` - File cannot be opened or read
/// * `AnalysisError::EmptyOrMalformedInput` - No line produced a stack
pub fn fold_file(path: impl AsRef<Path>) -> Result<FoldOutcome, AnalysisError> {
    let path = path.as_ref();
    let reader = open_source(path)?;
    fold_reader(reader, path)
}
