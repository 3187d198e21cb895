// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [promotion]
/// auto_cache_threshold = 2
///
/// [run]
/// metrics = ["city_growth", "retention"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Cache-promotion policy from `[promotion]`.
    #[serde(default)]
    pub promotion: PromotionSection,

    /// Default run selection from `[run]`.
    #[serde(default)]
    pub run: RunSection,
}

/// `[promotion]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionSection {
    /// A producer used by more metrics than this per run is promoted to
    /// cached mode (when its cache mode is `auto`).
    #[serde(default = "default_auto_cache_threshold")]
    pub auto_cache_threshold: usize,
}

fn default_auto_cache_threshold() -> usize {
    1
}

impl Default for PromotionSection {
    fn default() -> Self {
        Self {
            auto_cache_threshold: default_auto_cache_threshold(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunSection {
    /// Metrics to run when the CLI is invoked without `--metric` flags.
    /// Empty means "all registered metrics".
    #[serde(default)]
    pub metrics: Vec<String>,
}
