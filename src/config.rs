use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Significance threshold for every hypothesis-test decision.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Knobs for the aggregate report. Every field has a default, so a config
/// file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub alpha: f64,
    /// Number of equal-width bins in the price histogram.
    pub histogram_bins: usize,
    /// How many title words to list.
    pub top_words: usize,
    /// Shortest word counted in title word frequencies.
    pub min_word_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            histogram_bins: 20,
            top_words: 10,
            min_word_len: 3,
        }
    }
}

impl AnalysisConfig {
    /// Read overrides from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text).context("parsing config JSON")?;
        if !(config.alpha > 0.0 && config.alpha < 1.0) {
            anyhow::bail!("alpha must lie in (0, 1), got {}", config.alpha);
        }
        if config.histogram_bins == 0 {
            anyhow::bail!("histogram_bins must be at least 1");
        }
        if config.min_word_len == 0 {
            anyhow::bail!("min_word_len must be at least 1");
        }
        log::debug!("Loaded analysis config {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfscope.json");
        std::fs::write(&path, r#"{ "top_words": 5 }"#).unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.top_words, 5);
        assert_eq!(config.alpha, DEFAULT_ALPHA);
        assert_eq!(config.histogram_bins, 20);
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "alpha": 1.5 }"#).unwrap();
        assert!(AnalysisConfig::from_file(&path).is_err());
    }

    #[test]
    fn rejects_zero_min_word_len() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "min_word_len": 0 }"#).unwrap();
        let err = AnalysisConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("min_word_len"));
    }
}
