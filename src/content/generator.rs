//! Themed document generation.

use super::lexicon::{self, ADJ_SLOT, NOUN_SLOT, TITLE_SLOT, VERB_SLOT};
use crate::archetypes::ArchetypeRegistry;
use crate::config::{GenerationTuning, TargetingConfig};
use crate::error::{Result, TarpitError};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Upper bound on keywords spliced into a single paragraph.
const MAX_INJECTIONS: usize = 24;

/// A generated document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEnvelope {
    pub title: String,
    /// Paragraphs separated by a blank line
    pub body: String,
    /// Keyword set the document was built from
    pub keywords: Vec<String>,
    pub theme: String,
    pub archetype_id: String,
    /// Correlation token derived from title and body
    pub content_hash: String,
}

impl ContentEnvelope {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body.split("\n\n").filter(|p| !p.is_empty())
    }
}

/// Produces keyword-saturated documents themed by archetype.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    registry: Arc<ArchetypeRegistry>,
}

impl ContentGenerator {
    pub fn new(registry: Arc<ArchetypeRegistry>) -> Self {
        Self { registry }
    }

    /// Generate a document for `archetype_id`.
    ///
    /// Strong-identity archetypes draw from their curated theme; everything else
    /// (including unknown ids) uses the operator keywords and a configured theme.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        config: &TargetingConfig,
        rng: &mut R,
    ) -> Result<ContentEnvelope> {
        let (theme, keywords) = self.resolve_keywords(archetype_id, config, rng);
        if keywords.is_empty() {
            return Err(TarpitError::Generation(format!(
                "no keywords available for archetype '{archetype_id}'"
            )));
        }

        let title = self.title(&theme, &keywords, rng);
        let paragraphs: Vec<String> = (0..config.tuning.paragraph_count)
            .map(|_| self.paragraph(&keywords, &config.tuning, config.density_multiplier, rng))
            .collect();
        let body = paragraphs.join("\n\n");
        let content_hash = content_hash(&title, &body);

        Ok(ContentEnvelope {
            title,
            body,
            keywords,
            theme,
            archetype_id: archetype_id.to_string(),
            content_hash,
        })
    }

    fn resolve_keywords<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        config: &TargetingConfig,
        rng: &mut R,
    ) -> (String, Vec<String>) {
        let curated = self
            .registry
            .get(archetype_id)
            .and_then(|a| a.theme.as_deref());

        match curated {
            Some(name) => {
                let theme = lexicon::theme(name);
                let keywords = theme.curated_keywords.iter().map(|k| k.to_string()).collect();
                (theme.name.to_string(), keywords)
            }
            None => {
                let theme = config
                    .content_themes
                    .choose(rng)
                    .cloned()
                    .unwrap_or_else(|| lexicon::GENERIC_THEME.to_string());
                let keywords = config
                    .keywords
                    .iter()
                    .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" "))
                    .filter(|k| !k.is_empty())
                    .collect();
                (theme, keywords)
            }
        }
    }

    fn title<R: Rng + ?Sized>(&self, theme: &str, keywords: &[String], rng: &mut R) -> String {
        let template = pick(rng, lexicon::theme(theme).title_templates);
        let keyword = &keywords[rng.gen_range(0..keywords.len())];
        template.replacen(TITLE_SLOT, &lexicon::title_case(keyword), 1)
    }

    fn paragraph<R: Rng + ?Sized>(
        &self,
        keywords: &[String],
        tuning: &GenerationTuning,
        density: f64,
        rng: &mut R,
    ) -> String {
        let count = rng.gen_range(tuning.min_sentences..=tuning.max_sentences);
        let mut sentences = Vec::with_capacity(count);
        for i in 0..count {
            let sentence = sentence(rng);
            if i > 0 && rng.gen_bool(0.5) {
                let connector = pick(rng, lexicon::CONNECTORS);
                sentences.push(format!("{connector} {}", lowercase_first(&sentence)));
            } else {
                sentences.push(sentence);
            }
        }

        let text = sentences.join(" ");
        if !rng.gen_bool(tuning.injection_probability) {
            return text;
        }

        let mut words: Vec<String> = text.split(' ').map(String::from).collect();
        for _ in 0..injection_count(density, rng) {
            let keyword = &keywords[rng.gen_range(0..keywords.len())];
            let at = rng.gen_range(0..=words.len());
            words.insert(at, format!("<strong>{}</strong>", crate::render::escape(keyword)));
        }
        words.join(" ")
    }
}

/// Fill one sentence structure from the word banks.
fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(rng, lexicon::SENTENCE_STRUCTURES)
        .replacen(ADJ_SLOT, pick(rng, lexicon::ADJECTIVES), 1)
        .replacen(NOUN_SLOT, pick(rng, lexicon::NOUNS), 1)
        .replacen(VERB_SLOT, pick(rng, lexicon::VERBS), 1)
}

/// 1-3 keywords, scaled by the density multiplier.
fn injection_count<R: Rng + ?Sized>(density: f64, rng: &mut R) -> usize {
    let base = rng.gen_range(1..=3) as f64;
    ((base * density).round() as usize).clamp(1, MAX_INJECTIONS)
}

/// Pick from a static, non-empty bank.
pub(crate) fn pick<'a, R: Rng + ?Sized>(rng: &mut R, bank: &[&'a str]) -> &'a str {
    bank[rng.gen_range(0..bank.len())]
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hex SHA-256 prefix of title + body.
pub fn content_hash(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}
