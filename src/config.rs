//! Engine configuration loaded from TOML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables of the formula engine. Every key is optional in TOML.
///
/// ```toml
/// max_suggestions = 30
/// max_call_depth = 32
/// cache_formulas = true
/// fold_constants = true
/// display_precision = 2
/// log_filter = "costwright=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on autocomplete and "did you mean" candidates.
    pub max_suggestions: usize,
    /// Nested shared-function call limit.
    pub max_call_depth: usize,
    /// Cache parsed formulas by their text.
    pub cache_formulas: bool,
    /// Fold constant sub-expressions after parsing.
    pub fold_constants: bool,
    /// Decimals shown in field summaries and cost breakdowns.
    pub display_precision: u32,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 30,
            max_call_depth: crate::evaluator::DEFAULT_MAX_CALL_DEPTH,
            cache_formulas: true,
            fold_constants: true,
            display_precision: 2,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
