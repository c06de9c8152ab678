//! Builds the trap bundle attached to each bot document.

use super::interactive::InteractiveWidgets;
use super::{slug, CONTENT_SEGMENT, HIDDEN_BLOCK_CLASS, NESTED_FRAME_CLASS, RECURSIVE_LINK_COUNT};
use crate::archetypes::ArchetypeRegistry;
use crate::config::TargetingConfig;
use crate::content::lexicon::title_case;
use crate::error::{Result, TarpitError};
use crate::render::escape;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

static META_NAMES: &[&str] = &["keywords", "news_keywords", "article:tag"];

/// Hidden blocks added for targeted archetypes on top of the regular ones.
const DEEP_BLOCK_COUNT: usize = 2;

/// A `<meta>` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaEntry {
    pub name: String,
    pub content: String,
}

impl MetaEntry {
    pub fn to_html(&self) -> String {
        format!(
            r#"<meta name="{}" content="{}">"#,
            escape(&self.name),
            escape(&self.content)
        )
    }
}

/// A JSON-LD entry aimed at crawlers that prioritize semantic markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredDataEntry {
    pub schema_type: String,
    pub headline: String,
    pub keywords: Vec<String>,
}

impl StructuredDataEntry {
    /// Serialize as JSON-LD, safe to embed in a `<script>` element.
    pub fn to_json_ld(&self) -> Result<String> {
        let value = serde_json::json!({
            "@context": "https://schema.org",
            "@type": self.schema_type,
            "headline": self.headline,
            "keywords": self.keywords.join(", "),
        });
        Ok(serde_json::to_string(&value)?.replace("</", "<\\/"))
    }
}

/// A single nested frame reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedFrame {
    pub path: String,
    /// Depth the framed document may still nest
    pub remaining_depth: u32,
}

impl NestedFrame {
    pub fn to_html(&self) -> String {
        format!(
            r#"<iframe class="{NESTED_FRAME_CLASS}" src="{}" width="1" height="1" style="border:0;opacity:0;" loading="eager"></iframe>"#,
            escape(&self.path)
        )
    }
}

/// Trap elements for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrapBundle {
    /// Markup fragments not intended for visible rendering
    pub hidden_blocks: Vec<String>,
    pub meta_entries: Vec<MetaEntry>,
    pub structured_data_entries: Vec<StructuredDataEntry>,
    /// Synthetic follow-up paths
    pub recursive_links: Vec<String>,
    pub nested_frame: Option<NestedFrame>,
    pub interactive_widgets: Option<InteractiveWidgets>,
}

/// Composes trap bundles.
#[derive(Debug, Clone)]
pub struct TrapComposer {
    registry: Arc<ArchetypeRegistry>,
}

impl TrapComposer {
    pub fn new(registry: Arc<ArchetypeRegistry>) -> Self {
        Self { registry }
    }

    /// Compose a bundle using the configured recursion depth.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        keywords: &[String],
        config: &TargetingConfig,
        rng: &mut R,
    ) -> Result<TrapBundle> {
        self.compose_with_depth(archetype_id, keywords, config, config.recursion_depth, rng)
    }

    /// Compose a bundle with an explicit remaining frame depth.
    pub fn compose_with_depth<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        keywords: &[String],
        config: &TargetingConfig,
        depth: u32,
        rng: &mut R,
    ) -> Result<TrapBundle> {
        if keywords.is_empty() {
            return Err(TarpitError::Generation(
                "trap composition requires at least one keyword".to_string(),
            ));
        }

        let hidden_blocks = if config.hidden_traps {
            (0..rng.gen_range(3..=7))
                .map(|_| hidden_block(archetype_id, keywords, None, rng))
                .collect()
        } else {
            Vec::new()
        };

        let meta_entries = if config.meta_tag_injection {
            META_NAMES
                .iter()
                .map(|name| MetaEntry {
                    name: name.to_string(),
                    content: sample(keywords, 3, rng).join(", "),
                })
                .collect()
        } else {
            Vec::new()
        };

        let structured_data_entries = if rng.gen_bool(config.tuning.structured_data_probability) {
            let lead = &keywords[rng.gen_range(0..keywords.len())];
            vec![StructuredDataEntry {
                schema_type: "Article".to_string(),
                headline: format!("{} Insights", title_case(lead)),
                keywords: sample(keywords, 5, rng),
            }]
        } else {
            Vec::new()
        };

        let nested_frame = (depth > 0).then(|| {
            let token: [u8; 6] = rng.gen();
            NestedFrame {
                path: format!(
                    "/{}{CONTENT_SEGMENT}{}?depth={}",
                    slug(archetype_id),
                    hex::encode(token),
                    depth - 1
                ),
                remaining_depth: depth - 1,
            }
        });

        let interactive_widgets = if config.interactive_elements {
            Some(InteractiveWidgets::generate(
                archetype_id,
                self.registry.get(archetype_id),
                keywords,
                rng,
            )?)
        } else {
            None
        };

        Ok(TrapBundle {
            hidden_blocks,
            meta_entries,
            structured_data_entries,
            recursive_links: recursive_links(archetype_id),
            nested_frame,
            interactive_widgets,
        })
    }

    /// Extra hidden blocks for targeted archetypes, each linking back into the
    /// recursive link space.
    pub fn deep_blocks<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        keywords: &[String],
        rng: &mut R,
    ) -> Vec<String> {
        if keywords.is_empty() {
            return Vec::new();
        }
        let links = recursive_links(archetype_id);
        (0..DEEP_BLOCK_COUNT)
            .map(|_| {
                let link = &links[rng.gen_range(0..links.len())];
                hidden_block(archetype_id, keywords, Some(link), rng)
            })
            .collect()
    }
}

/// The five stable follow-up paths for an archetype.
pub fn recursive_links(archetype_id: &str) -> Vec<String> {
    let prefix = slug(archetype_id);
    (0..RECURSIVE_LINK_COUNT)
        .map(|i| format!("/{prefix}{CONTENT_SEGMENT}{}", link_token(i)))
        .collect()
}

fn link_token(i: usize) -> String {
    hex::encode(Sha256::digest(i.to_string().as_bytes()))[..12].to_string()
}

fn hidden_block<R: Rng + ?Sized>(
    archetype_id: &str,
    keywords: &[String],
    link: Option<&str>,
    rng: &mut R,
) -> String {
    let words: Vec<String> = (0..rng.gen_range(5..=15))
        .map(|_| escape(&keywords[rng.gen_range(0..keywords.len())]))
        .collect();
    let text = words.join(" ");
    let inner = match link {
        Some(href) => format!(r#"<a href="{}">{text}</a>"#, escape(href)),
        None => text,
    };
    format!(
        r#"<div class="{HIDDEN_BLOCK_CLASS}" style="display:none" aria-hidden="true" data-archetype="{}">{inner}</div>"#,
        escape(archetype_id)
    )
}

fn sample<R: Rng + ?Sized>(keywords: &[String], max: usize, rng: &mut R) -> Vec<String> {
    keywords
        .choose_multiple(rng, max.min(keywords.len()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::ids;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn composer() -> TrapComposer {
        TrapComposer::new(Arc::new(ArchetypeRegistry::with_defaults()))
    }

    fn keywords() -> Vec<String> {
        ["alpha", "beta", "gamma", "delta"].map(String::from).to_vec()
    }

    #[test]
    fn test_hidden_block_counts() {
        let config = TargetingConfig::default();
        for seed in 0..30 {
            let bundle = composer()
                .compose(ids::NEWS_CRAWLER, &keywords(), &config, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert!((3..=7).contains(&bundle.hidden_blocks.len()));
            for block in &bundle.hidden_blocks {
                assert!(block.contains(HIDDEN_BLOCK_CLASS));
                assert!(block.contains("data-archetype=\"news-crawler\""));
                assert!(block.contains("display:none"));
            }
        }
    }

    #[test]
    fn test_hidden_traps_toggle() {
        let config = TargetingConfig {
            hidden_traps: false,
            ..Default::default()
        };
        let bundle = composer()
            .compose(ids::NEWS_CRAWLER, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(bundle.hidden_blocks.is_empty());
    }

    #[test]
    fn test_meta_entries_reference_at_most_three_keywords() {
        let config = TargetingConfig::default();
        let bundle = composer()
            .compose(ids::SHOPPING_BOT, &keywords(), &config, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(bundle.meta_entries.len(), META_NAMES.len());
        for entry in &bundle.meta_entries {
            assert!(entry.content.split(", ").count() <= 3);
        }
    }

    #[test]
    fn test_structured_data_probability_extremes() {
        let mut config = TargetingConfig::default();
        config.tuning.structured_data_probability = 1.0;
        let bundle = composer()
            .compose(ids::SHOPPING_BOT, &keywords(), &config, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(bundle.structured_data_entries.len(), 1);
        let json = bundle.structured_data_entries[0].to_json_ld().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["@type"], "Article");

        config.tuning.structured_data_probability = 0.0;
        let bundle = composer()
            .compose(ids::SHOPPING_BOT, &keywords(), &config, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert!(bundle.structured_data_entries.is_empty());
    }

    #[test]
    fn test_recursive_links_are_stable() {
        let config = TargetingConfig::default();
        let a = composer()
            .compose(ids::MODEL_TRAINER, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = composer()
            .compose(ids::MODEL_TRAINER, &keywords(), &config, &mut StdRng::seed_from_u64(99))
            .unwrap();
        assert_eq!(a.recursive_links.len(), RECURSIVE_LINK_COUNT);
        assert_eq!(a.recursive_links, b.recursive_links);
        assert!(a.recursive_links.iter().all(|l| l.starts_with("/model-trainer/content/")));
    }

    #[test]
    fn test_recursion_bound() {
        let mut config = TargetingConfig {
            recursion_depth: 0,
            ..Default::default()
        };
        let bundle = composer()
            .compose(ids::NEWS_CRAWLER, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(bundle.nested_frame.is_none());

        config.recursion_depth = 3;
        let bundle = composer()
            .compose(ids::NEWS_CRAWLER, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let frame = bundle.nested_frame.unwrap();
        assert_eq!(frame.remaining_depth, 2);
        assert!(frame.path.ends_with("?depth=2"));
        assert!(frame.to_html().contains(NESTED_FRAME_CLASS));
    }

    #[test]
    fn test_interactive_toggle() {
        let mut config = TargetingConfig::default();
        let bundle = composer()
            .compose(ids::VIDEO_PLATFORM, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(bundle.interactive_widgets.is_some());

        config.interactive_elements = false;
        let bundle = composer()
            .compose(ids::VIDEO_PLATFORM, &keywords(), &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(bundle.interactive_widgets.is_none());
    }

    #[test]
    fn test_deep_blocks_link_into_recursive_space() {
        let blocks = composer().deep_blocks(ids::NEWS_CRAWLER, &keywords(), &mut StdRng::seed_from_u64(1));
        assert_eq!(blocks.len(), DEEP_BLOCK_COUNT);
        assert!(blocks.iter().all(|b| b.contains("href=\"/news-crawler/content/")));
    }

    #[test]
    fn test_keywords_are_escaped() {
        let config = TargetingConfig::default();
        let bundle = composer()
            .compose(
                ids::NEWS_CRAWLER,
                &["<script>".to_string()],
                &config,
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        assert!(bundle.hidden_blocks.iter().all(|b| !b.contains("<script>")));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let config = TargetingConfig::default();
        let result = composer().compose(ids::NEWS_CRAWLER, &[], &config, &mut StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }
}
