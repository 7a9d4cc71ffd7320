//! Configuration and constants for the analyzer.
//!
//! Query defaults can be overridden with a TOML file:
//!
//! ```toml
//! topk_symbols = 30
//! topk_stacks = 10
//! order = "leaf"
//! path_limit = 50
//!
//! [collapse]
//! include_pid = true
//! kernel = true
//! ```

use super::error::ConfigError;
use crate::aggregator::RankOrder;
use crate::parser::CollapseOptions;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Frame delimiter in folded stacks
pub const FRAME_SEPARATOR: char = ';';

pub const DEFAULT_TOPK: usize = 20;
pub const DEFAULT_PATH_LIMIT: usize = 200;
pub const DEFAULT_PREVIEW_LIMIT: usize = 200;

// A profile is "concentrated" when the top 10% of stacks hold more than this
pub const CONCENTRATION_THRESHOLD_PERCENT: f64 = 80.0;

/// Defaults applied to CLI queries when the flag is not given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub topk_symbols: usize,
    pub topk_stacks: usize,
    pub order: RankOrder,
    pub path_limit: usize,
    pub preview_limit: usize,
    pub collapse: CollapseOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            topk_symbols: DEFAULT_TOPK,
            topk_stacks: DEFAULT_TOPK,
            order: RankOrder::Inclusive,
            path_limit: DEFAULT_PATH_LIMIT,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            collapse: CollapseOptions::default(),
        }
    }
}

/// Load an analysis config from a TOML file
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AnalysisConfig = toml::from_str(&contents)?;

    if config.topk_symbols == 0 && config.topk_stacks == 0 {
        warn!("topk_symbols and topk_stacks are both 0; summaries will be empty");
    }

    Ok(config)
}
