//! Archetype registry.
//!
//! Static table of crawler archetypes. Each archetype carries the substrings that
//! identify it and the interests used to theme its trap content. Registration
//! order is the classifier's priority order.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Built-in archetype ids.
pub mod ids {
    /// Sentinel for humans and unrecognized clients
    pub const GENERIC: &str = "generic";
    pub const VIDEO_PLATFORM: &str = "video-platform";
    pub const NEWS_CRAWLER: &str = "news-crawler";
    pub const SHOPPING_BOT: &str = "shopping-bot";
    pub const ACADEMIC_CRAWLER: &str = "academic-crawler";
    pub const MODEL_TRAINER: &str = "model-trainer";
}

/// An archetype definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeSignature {
    /// Archetype id (e.g., "model-trainer")
    pub id: String,

    /// Substrings matched against the User-Agent
    #[serde(default)]
    pub identity_patterns: Vec<String>,

    /// Substrings matched against the request path
    #[serde(default)]
    pub path_patterns: Vec<String>,

    /// Topics this archetype is presumed to favor
    #[serde(default)]
    pub interest_keywords: Vec<String>,

    /// Preferred content categories
    #[serde(default)]
    pub content_affinities: Vec<String>,

    /// Preferred bait formats, most preferred first
    #[serde(default)]
    pub file_affinities: Vec<String>,

    /// Curated lexicon theme. Archetypes with a theme are "strong-identity" and
    /// ignore the operator keywords.
    #[serde(default)]
    pub theme: Option<String>,
}

/// Archetype with patterns pre-lowercased for matching.
#[derive(Debug, Clone)]
struct CompiledArchetype {
    signature: ArchetypeSignature,
    identity_patterns: Vec<String>,
    path_patterns: Vec<String>,
}

impl CompiledArchetype {
    fn compile(signature: ArchetypeSignature) -> Self {
        let lower = |patterns: &[String]| -> Vec<String> {
            patterns
                .iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            identity_patterns: lower(&signature.identity_patterns),
            path_patterns: lower(&signature.path_patterns),
            signature,
        }
    }
}

/// Immutable, ordered archetype table.
#[derive(Debug, Clone)]
pub struct ArchetypeRegistry {
    archetypes: Vec<CompiledArchetype>,
}

impl ArchetypeRegistry {
    /// Build a registry, checking id uniqueness and pattern presence.
    pub fn new(signatures: Vec<ArchetypeSignature>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut archetypes = Vec::with_capacity(signatures.len());

        for signature in signatures {
            if signature.id.trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if signature.id == ids::GENERIC {
                return Err(RegistryError::ReservedId(signature.id));
            }
            if !seen.insert(signature.id.clone()) {
                return Err(RegistryError::DuplicateId(signature.id));
            }

            let compiled = CompiledArchetype::compile(signature);
            if compiled.identity_patterns.is_empty() && compiled.path_patterns.is_empty() {
                return Err(RegistryError::NoPatterns(compiled.signature.id));
            }
            archetypes.push(compiled);
        }

        Ok(Self { archetypes })
    }

    /// Load a registry from a JSON file, or the built-in table when the file is absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Archetype file not found, using built-in registry");
            return Ok(Self::with_defaults());
        }

        let content = std::fs::read_to_string(path)?;
        let signatures: Vec<ArchetypeSignature> = serde_json::from_str(&content)?;
        let registry = Self::new(signatures)?;
        info!(
            path = %path.display(),
            archetypes = registry.len(),
            "Loaded archetype registry"
        );
        Ok(registry)
    }

    /// Registry with the built-in archetypes.
    pub fn with_defaults() -> Self {
        let archetypes = default_signatures()
            .into_iter()
            .map(CompiledArchetype::compile)
            .collect();
        Self { archetypes }
    }

    /// Look up an archetype by id.
    pub fn get(&self, id: &str) -> Option<&ArchetypeSignature> {
        self.archetypes
            .iter()
            .map(|a| &a.signature)
            .find(|s| s.id == id)
    }

    /// Archetype ids in classification priority order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.archetypes.iter().map(|a| a.signature.id.as_str())
    }

    /// First archetype (in priority order) with an identity pattern contained in
    /// `identity_lower`, together with the matching pattern.
    pub(crate) fn match_identity(&self, identity_lower: &str) -> Option<(&str, &str)> {
        Self::first_match(&self.archetypes, identity_lower, |a| &a.identity_patterns)
    }

    /// First archetype (in priority order) with a path pattern contained in `path_lower`.
    pub(crate) fn match_path(&self, path_lower: &str) -> Option<(&str, &str)> {
        Self::first_match(&self.archetypes, path_lower, |a| &a.path_patterns)
    }

    fn first_match<'a>(
        archetypes: &'a [CompiledArchetype],
        haystack: &str,
        patterns: impl Fn(&'a CompiledArchetype) -> &'a Vec<String>,
    ) -> Option<(&'a str, &'a str)> {
        if haystack.is_empty() {
            return None;
        }
        archetypes.iter().find_map(|archetype| {
            patterns(archetype)
                .iter()
                .find(|p| haystack.contains(p.as_str()))
                .map(|p| (archetype.signature.id.as_str(), p.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in archetypes in priority order.
fn default_signatures() -> Vec<ArchetypeSignature> {
    vec![
        ArchetypeSignature {
            id: ids::VIDEO_PLATFORM.to_string(),
            identity_patterns: strings(&["tiktok", "bytedance", "tt_webview"]),
            path_patterns: strings(&["/video/", "/music/", "/tag/", "/challenge/"]),
            interest_keywords: strings(&["short video", "trending", "hashtag", "challenge"]),
            content_affinities: strings(&["video", "music", "dance"]),
            file_affinities: strings(&["mp4", "json", "zip"]),
            theme: Some("viral".to_string()),
        },
        ArchetypeSignature {
            id: ids::NEWS_CRAWLER.to_string(),
            identity_patterns: strings(&["googlebot-news", "bingnews", "newscrawler"]),
            path_patterns: strings(&["/news/", "/article/", "/202", "/breaking/"]),
            interest_keywords: strings(&["breaking", "exclusive", "report", "analysis"]),
            content_affinities: strings(&["article", "news", "report"]),
            file_affinities: strings(&["pdf", "xml", "json"]),
            theme: None,
        },
        ArchetypeSignature {
            id: ids::SHOPPING_BOT.to_string(),
            identity_patterns: strings(&["pricegrabber", "shoppingbot", "alibot"]),
            path_patterns: strings(&["/product/", "/shop/", "/buy/", "/price/"]),
            interest_keywords: strings(&["discount", "sale", "price", "buy", "deal"]),
            content_affinities: strings(&["product", "review", "price"]),
            file_affinities: strings(&["csv", "json", "xml"]),
            theme: None,
        },
        ArchetypeSignature {
            id: ids::ACADEMIC_CRAWLER.to_string(),
            identity_patterns: strings(&["semanticscholar", "academicbot", "research"]),
            path_patterns: strings(&["/paper/", "/study/", "/research/", "/pdf/", "/dataset/"]),
            interest_keywords: strings(&["study", "research", "data", "analysis", "findings"]),
            content_affinities: strings(&["paper", "study", "dataset"]),
            file_affinities: strings(&["pdf", "csv", "json", "zip"]),
            theme: None,
        },
        ArchetypeSignature {
            id: ids::MODEL_TRAINER.to_string(),
            identity_patterns: strings(&["gptbot", "claudebot", "anthropic", "cohere"]),
            path_patterns: strings(&["/ai/", "/ml/", "/dataset/", "/training/"]),
            interest_keywords: strings(&[
                "artificial intelligence",
                "machine learning",
                "dataset",
            ]),
            content_affinities: strings(&["tutorial", "explanation", "example"]),
            file_affinities: strings(&["json", "csv", "txt", "zip", "pdf"]),
            theme: Some("technical".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(id: &str, identity: &[&str], path: &[&str]) -> ArchetypeSignature {
        ArchetypeSignature {
            id: id.to_string(),
            identity_patterns: strings(identity),
            path_patterns: strings(path),
            interest_keywords: vec![],
            content_affinities: vec![],
            file_affinities: vec![],
            theme: None,
        }
    }

    #[test]
    fn test_default_registry_order() {
        let registry = ArchetypeRegistry::with_defaults();
        let order: Vec<&str> = registry.ids().collect();
        assert_eq!(
            order,
            vec![
                ids::VIDEO_PLATFORM,
                ids::NEWS_CRAWLER,
                ids::SHOPPING_BOT,
                ids::ACADEMIC_CRAWLER,
                ids::MODEL_TRAINER,
            ]
        );
    }

    #[test]
    fn test_defaults_pass_validation() {
        assert!(ArchetypeRegistry::new(default_signatures()).is_ok());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = ArchetypeRegistry::new(vec![
            signature("a", &["x"], &[]),
            signature("a", &[], &["/y/"]),
        ]);
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateId("a".into()));
    }

    #[test]
    fn test_patternless_archetype_rejected() {
        let result = ArchetypeRegistry::new(vec![signature("empty", &[], &[""])]);
        assert_eq!(result.unwrap_err(), RegistryError::NoPatterns("empty".into()));
    }

    #[test]
    fn test_generic_id_reserved() {
        let result = ArchetypeRegistry::new(vec![signature("generic", &["x"], &[])]);
        assert!(matches!(result, Err(RegistryError::ReservedId(_))));
    }

    #[test]
    fn test_patterns_are_lowercased() {
        let registry = ArchetypeRegistry::new(vec![signature("mixed", &["MixedCase"], &[])]).unwrap();
        assert_eq!(registry.match_identity("a mixedcase ua"), Some(("mixed", "mixedcase")));
    }

    #[test]
    fn test_empty_haystack_never_matches() {
        let registry = ArchetypeRegistry::with_defaults();
        assert_eq!(registry.match_identity(""), None);
        assert_eq!(registry.match_path(""), None);
    }

    #[test]
    fn test_curated_themes() {
        let registry = ArchetypeRegistry::with_defaults();
        assert!(registry.get(ids::MODEL_TRAINER).unwrap().theme.is_some());
        assert!(registry.get(ids::NEWS_CRAWLER).unwrap().theme.is_none());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let registry = ArchetypeRegistry::load(Path::new("/nonexistent/archetypes.json")).unwrap();
        assert_eq!(registry.len(), 5);
    }
}
