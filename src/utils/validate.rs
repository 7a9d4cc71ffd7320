//! Boundary validation for query parameters.
//!
//! Callers (CLI, RPC shims) receive counts as signed integers and strings;
//! these helpers turn them into the typed values the analyzers take, or
//! reject them with `AnalysisError::InvalidParameter` before any work starts.

use super::error::AnalysisError;
use crate::aggregator::RankOrder;
use serde::{Deserialize, Serialize};

/// Validate a non-negative count such as `topk_symbols` or `limit`
pub fn validate_count(name: &str, value: i64) -> Result<usize, AnalysisError> {
    usize::try_from(value)
        .map_err(|_| AnalysisError::invalid(format!("{} must be >= 0 (got {})", name, value)))
}

/// Validate an optional depth limit
pub fn validate_depth(depth: Option<i64>) -> Result<Option<usize>, AnalysisError> {
    depth.map(|d| validate_count("depth", d)).transpose()
}

/// Validate the ranking order name
pub fn validate_order(order: &str) -> Result<RankOrder, AnalysisError> {
    order.parse()
}

/// Validate that a symbol query is not empty
pub fn validate_symbol(symbol: &str) -> Result<&str, AnalysisError> {
    if symbol.is_empty() {
        return Err(AnalysisError::invalid("symbol is required"));
    }
    Ok(symbol)
}

/// Raw query parameters as received at the boundary
///
/// Unset values fall back to the defaults given to the accessors (usually
/// from `AnalysisConfig`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub topk_symbols: Option<i64>,
    pub topk_stacks: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<String>,
    pub symbol: Option<String>,
    pub fuzzy: bool,
    pub depth: Option<i64>,
    pub start_symbol: Option<String>,
    pub process_filter: Option<String>,
}

impl QueryParams {
    pub fn topk_symbols(&self, default: usize) -> Result<usize, AnalysisError> {
        self.count("topk_symbols", self.topk_symbols, default)
    }

    pub fn topk_stacks(&self, default: usize) -> Result<usize, AnalysisError> {
        self.count("topk_stacks", self.topk_stacks, default)
    }

    pub fn limit(&self, default: usize) -> Result<usize, AnalysisError> {
        self.count("limit", self.limit, default)
    }

    pub fn order(&self, default: RankOrder) -> Result<RankOrder, AnalysisError> {
        match self.order.as_deref() {
            Some(order) => validate_order(order),
            None => Ok(default),
        }
    }

    /// The required `symbol` parameter
    pub fn symbol(&self) -> Result<&str, AnalysisError> {
        validate_symbol(self.symbol.as_deref().unwrap_or(""))
    }

    pub fn depth(&self) -> Result<Option<usize>, AnalysisError> {
        validate_depth(self.depth)
    }

    fn count(&self, name: &str, value: Option<i64>, default: usize) -> Result<usize, AnalysisError> {
        value.map_or(Ok(default), |v| validate_count(name, v))
    }
}
