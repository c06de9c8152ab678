//! Configuration types for the tar pit.

use crate::archetypes::ids;
use crate::error::ConfigError;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Main configuration for the tar pit server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TarpitConfig {
    /// Listener and status surface settings
    pub server: ServerConfig,

    /// Targeting policy (hot-reloadable)
    pub targeting: TargetingConfig,

    /// Generated artifact cache settings
    pub cache: CacheConfig,

    /// Include classification headers in responses
    pub debug_headers: bool,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub listen: String,

    /// Path serving the statistics snapshot as JSON. Disabled when unset.
    pub status_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            status_path: None,
        }
    }
}

/// Operator targeting policy.
///
/// Replaced as a whole through [`ConfigStore`]; a request only ever sees one
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Seed keywords injected into generated documents
    pub keywords: Vec<String>,

    /// Archetype ids that receive the full trap treatment
    pub targeted_archetypes: Vec<String>,

    /// Lexicon themes used for archetypes without a curated theme
    pub content_themes: Vec<String>,

    /// Scales how many keywords are spliced into each paragraph
    pub density_multiplier: f64,

    /// Maximum chain of nested trap frames
    pub recursion_depth: u32,

    /// Emit hidden keyword blocks
    pub hidden_traps: bool,

    /// Emit buttons, forms and scripts for targeted archetypes
    pub interactive_elements: bool,

    /// Promote synthetic downloads to targeted archetypes
    pub bait_files_enabled: bool,

    /// Serve synthetic files on `/download/`
    pub download_traps: bool,

    /// Emit keyword meta tags
    pub meta_tag_injection: bool,

    /// Text generation tuning
    pub tuning: GenerationTuning,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            keywords: ["viral", "trending", "challenge", "dance", "music"]
                .into_iter()
                .map(String::from)
                .collect(),
            targeted_archetypes: vec![
                ids::VIDEO_PLATFORM.to_string(),
                ids::MODEL_TRAINER.to_string(),
            ],
            content_themes: ["viral", "technical", "news"]
                .into_iter()
                .map(String::from)
                .collect(),
            density_multiplier: 2.0,
            recursion_depth: 5,
            hidden_traps: true,
            interactive_elements: true,
            bait_files_enabled: true,
            download_traps: true,
            meta_tag_injection: true,
            tuning: GenerationTuning::default(),
        }
    }
}

impl TargetingConfig {
    /// Whether the archetype is selected for high-intensity trapping.
    ///
    /// Unknown ids in `targeted_archetypes` never match anything.
    pub fn is_targeted(&self, archetype_id: &str) -> bool {
        self.targeted_archetypes.iter().any(|a| a == archetype_id)
    }

    /// Reject configurations the generator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptyKeywords);
        }
        if !self.density_multiplier.is_finite() || self.density_multiplier <= 0.0 {
            return Err(ConfigError::InvalidDensity(self.density_multiplier));
        }
        self.tuning.validate()
    }
}

/// Tuning constants for the text generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationTuning {
    /// Paragraphs per document
    pub paragraph_count: usize,

    /// Chance that a paragraph receives spliced keywords (0.0-1.0)
    pub injection_probability: f64,

    /// Minimum sentences per paragraph
    pub min_sentences: usize,

    /// Maximum sentences per paragraph
    pub max_sentences: usize,

    /// Chance of emitting a JSON-LD block (0.0-1.0)
    pub structured_data_probability: f64,
}

impl Default for GenerationTuning {
    fn default() -> Self {
        Self {
            paragraph_count: 5,
            injection_probability: 0.7,
            min_sentences: 3,
            max_sentences: 6,
            structured_data_probability: 0.5,
        }
    }
}

impl GenerationTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("injection_probability", self.injection_probability),
            ("structured_data_probability", self.structured_data_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }
        if self.min_sentences == 0 || self.min_sentences > self.max_sentences {
            return Err(ConfigError::InvalidSentenceRange {
                min: self.min_sentences,
                max: self.max_sentences,
            });
        }
        Ok(())
    }
}

/// Generated artifact cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached artifacts
    pub artifact_cache_size: u64,

    /// Artifact TTL in seconds
    pub artifact_cache_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            artifact_cache_size: 256,
            artifact_cache_ttl_seconds: 300,
        }
    }
}

/// Atomically swappable holder for the active [`TargetingConfig`].
pub struct ConfigStore {
    current: ArcSwap<TargetingConfig>,
    version: AtomicU64,
}

impl ConfigStore {
    /// Create a store after validating the initial config.
    pub fn new(config: TargetingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            current: ArcSwap::from_pointee(config),
            version: AtomicU64::new(1),
        })
    }

    /// Current snapshot. Holders keep it alive across a concurrent swap.
    pub fn snapshot(&self) -> Arc<TargetingConfig> {
        self.current.load_full()
    }

    /// Replace the config wholesale. Invalid configs leave the old one in place.
    pub fn replace(&self, config: TargetingConfig) -> Result<u64, ConfigError> {
        config.validate()?;
        self.current.store(Arc::new(config));
        Ok(self.version.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Swap in a config without validation.
    #[cfg(test)]
    pub(crate) fn store_unchecked(&self, config: TargetingConfig) {
        self.current.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TarpitConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert!(config.server.status_path.is_none());
        assert_eq!(config.targeting.tuning.paragraph_count, 5);
        assert!(config.targeting.hidden_traps);
        assert!(config.targeting.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = TarpitConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TarpitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.targeting, config.targeting);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "targeting:\n  keywords: [dataset, gpu]\n  recursion_depth: 0\n";
        let parsed: TarpitConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.targeting.keywords, vec!["dataset", "gpu"]);
        assert_eq!(parsed.targeting.recursion_depth, 0);
        assert!((parsed.targeting.density_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(parsed.cache.artifact_cache_size, 256);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TargetingConfig {
            keywords: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyKeywords));

        config.keywords = vec!["data".into()];
        config.density_multiplier = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDensity(0.0)));

        config.density_multiplier = 1.0;
        config.tuning.injection_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { field: "injection_probability", .. })
        ));

        config.tuning.injection_probability = 0.7;
        config.tuning.min_sentences = 4;
        config.tuning.max_sentences = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSentenceRange { min: 4, max: 2 })
        ));
    }

    #[test]
    fn test_unknown_targeted_archetype_tolerated() {
        let config = TargetingConfig {
            targeted_archetypes: vec!["no-such-bot".into()],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(!config.is_targeted(ids::MODEL_TRAINER));
    }

    #[test]
    fn test_store_replace_keeps_old_snapshot_alive() {
        let store = ConfigStore::new(TargetingConfig::default()).unwrap();
        let before = store.snapshot();

        let next = TargetingConfig {
            keywords: vec!["replacement".into()],
            ..Default::default()
        };
        assert_eq!(store.replace(next).unwrap(), 2);

        assert_eq!(before.keywords[0], "viral");
        assert_eq!(store.snapshot().keywords, vec!["replacement"]);
    }

    #[test]
    fn test_store_rejects_invalid_replacement() {
        let store = ConfigStore::new(TargetingConfig::default()).unwrap();
        let bad = TargetingConfig {
            keywords: vec![],
            ..Default::default()
        };
        assert!(store.replace(bad).is_err());
        assert_eq!(store.snapshot().keywords[0], "viral");

        let good = TargetingConfig {
            keywords: vec!["next".into()],
            ..Default::default()
        };
        assert_eq!(store.replace(good).unwrap(), 2);
    }
}
