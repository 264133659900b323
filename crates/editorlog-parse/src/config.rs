use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ParseError;

/// Tunables for a parse run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// How many leading lines are searched for session metadata.
    pub header_scan_lines: usize,
    /// How many lines after a pipeline refresh header may carry its summary.
    pub refresh_lookahead: usize,
    /// Classified lines handed to the sink per call.
    pub line_batch_size: usize,
    /// Lines between two progress notifications.
    pub progress_interval: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            header_scan_lines: 100,
            refresh_lookahead: 10,
            line_batch_size: 1000,
            progress_interval: 1000,
        }
    }
}

impl ParserConfig {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParseError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ParseError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::debug!("Loaded parser config from {:?}: {:?}", path, config);
        Ok(config)
    }
}
