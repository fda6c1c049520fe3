//! Configuration structures for the statement pipeline.
//!
//! Extraction patterns and keyword sets are compiled in (see
//! [`patterns`](crate::statement::rules::patterns)); this file only carries
//! caller preferences around them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CardsumError, Result};

use super::statement::HeaderDefaults;

/// Main configuration for the cardsum pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsumConfig {
    /// Fallbacks for header fields the statement does not provide.
    pub defaults: HeaderDefaults,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Report output configuration.
    pub output: OutputConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum total text length to accept a document as readable.
    pub min_text_length: usize,

    /// Fail when any single page yields no text.
    pub reject_empty_pages: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 20,
            reject_empty_pages: true,
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format name (json, csv, text).
    pub format: String,

    /// Add a summary sheet with header fields and totals.
    pub summary_sheet: bool,

    /// Add a sheet listing payments and credits.
    pub credits_sheet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            summary_sheet: true,
            credits_sheet: true,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of documents processed in parallel.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

impl CardsumConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CardsumError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CardsumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
