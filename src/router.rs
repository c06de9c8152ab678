//! Response routing.
//!
//! Classification picks the branch once per request. Humans get [`HUMAN_PAGE`];
//! bots get a trap response chosen by path, built from one [`ContentEnvelope`] and
//! [`TrapBundle`](crate::traps::TrapBundle).

use crate::archetypes::ArchetypeRegistry;
use crate::artifacts::{ArtifactGenerator, KNOWN_FORMATS};
use crate::cache::ArtifactCache;
use crate::classifier::{ClassificationResult, Classifier, RequestContext};
use crate::config::{CacheConfig, ConfigStore, TargetingConfig};
use crate::content::lexicon::title_case;
use crate::content::{ContentEnvelope, ContentGenerator};
use crate::error::Result;
use crate::render::{self, ListingEntry, VisitFooter, HUMAN_PAGE};
use crate::stats::{StatsEvent, Statistics};
use crate::traps::{slug, TrapComposer};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// `/download/[archetype/]name[.ext]`, capturing the extension.
static DOWNLOAD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/download/(?:[^/]+/)*[^/]*?(?:\.([A-Za-z0-9]{1,8}))?$").unwrap()
});

/// Number of download offers on a targeted page.
const OFFER_COUNT: usize = 3;

const HTML: &str = "text/html; charset=utf-8";
const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// A synthetic download advertised on a bot document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatOffer {
    pub format: String,
    pub label: String,
    pub path: String,
    pub data_points: u32,
    pub updated_days_ago: u32,
}

/// A rendered trap document and the offers it advertises.
#[derive(Debug, Clone)]
pub struct BotResponse {
    pub document: String,
    pub offers: Vec<FormatOffer>,
}

/// Extra section placed above a document's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLead {
    None,
    Listing,
    Submission,
}

/// Builds documents from the generator and composer.
#[derive(Debug, Clone)]
pub struct TarpitEngine {
    registry: Arc<ArchetypeRegistry>,
    generator: ContentGenerator,
    composer: TrapComposer,
    stats: Arc<Statistics>,
}

impl TarpitEngine {
    pub fn new(registry: Arc<ArchetypeRegistry>, stats: Arc<Statistics>) -> Self {
        Self {
            generator: ContentGenerator::new(Arc::clone(&registry)),
            composer: TrapComposer::new(Arc::clone(&registry)),
            registry,
            stats,
        }
    }

    /// Full trap document at the configured recursion depth.
    pub fn build_bot_response<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        config: &TargetingConfig,
        rng: &mut R,
    ) -> Result<BotResponse> {
        self.build_page(archetype_id, config, config.recursion_depth, PageLead::None, rng)
    }

    /// The page every human request receives.
    pub fn build_human_response(&self) -> String {
        HUMAN_PAGE.to_string()
    }

    /// Trap document with an explicit frame depth and lead section.
    pub fn build_page<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        config: &TargetingConfig,
        depth: u32,
        lead: PageLead,
        rng: &mut R,
    ) -> Result<BotResponse> {
        let targeted = config.is_targeted(archetype_id);
        let envelope = self.generator.generate(archetype_id, config, rng)?;
        let mut bundle =
            self.composer
                .compose_with_depth(archetype_id, &envelope.keywords, config, depth, rng)?;

        if targeted {
            if config.hidden_traps {
                let deep = self.composer.deep_blocks(archetype_id, &envelope.keywords, rng);
                bundle.hidden_blocks.extend(deep);
            }
        } else {
            bundle.interactive_widgets = None;
        }

        let offers = if targeted && config.bait_files_enabled {
            self.offers(archetype_id, &envelope.keywords, rng)
        } else {
            Vec::new()
        };

        let lead = match lead {
            PageLead::None => None,
            PageLead::Listing => {
                let topics = match self.registry.get(archetype_id) {
                    Some(a) if !a.interest_keywords.is_empty() => &a.interest_keywords,
                    _ => &envelope.keywords,
                };
                Some(render::listing_section(&listing(archetype_id, topics, rng))?)
            }
            PageLead::Submission => Some(render::submission_notice(&format!(
                "/download/{}/submission_dataset.zip",
                slug(archetype_id)
            ))),
        };

        let footer = VisitFooter::now(self.stats.total_requests());
        let document = render::bot_document(&envelope, &bundle, &offers, lead.as_deref(), &footer)?;
        Ok(BotResponse { document, offers })
    }

    /// Generate just the envelope, for JSON routes.
    pub fn envelope<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        config: &TargetingConfig,
        rng: &mut R,
    ) -> Result<ContentEnvelope> {
        self.generator.generate(archetype_id, config, rng)
    }

    /// Three offers from the archetype's file affinities, padded with defaults.
    fn offers<R: Rng + ?Sized>(
        &self,
        archetype_id: &str,
        keywords: &[String],
        rng: &mut R,
    ) -> Vec<FormatOffer> {
        let mut formats: Vec<String> = self
            .registry
            .get(archetype_id)
            .map(|a| a.file_affinities.clone())
            .unwrap_or_default();
        for format in KNOWN_FORMATS {
            if formats.len() >= OFFER_COUNT {
                break;
            }
            if !formats.iter().any(|f| f == format) {
                formats.push(format.to_string());
            }
        }

        let arch = slug(archetype_id);
        formats
            .into_iter()
            .take(OFFER_COUNT)
            .map(|format| {
                let keyword = &keywords[rng.gen_range(0..keywords.len())];
                FormatOffer {
                    label: format!("{} Dataset", title_case(keyword)),
                    path: format!("/download/{arch}/{}_dataset.{format}", slug(keyword)),
                    data_points: rng.gen_range(1_000..=50_000),
                    updated_days_ago: rng.gen_range(1..=30),
                    format,
                }
            })
            .collect()
    }
}

fn listing<R: Rng + ?Sized>(archetype_id: &str, keywords: &[String], rng: &mut R) -> Vec<ListingEntry> {
    let arch = slug(archetype_id);
    (0..rng.gen_range(8..=20))
        .map(|i| {
            let keyword = &keywords[rng.gen_range(0..keywords.len())];
            let format = KNOWN_FORMATS.choose(rng).copied().unwrap_or("csv");
            let name = format!("{}_{}.{format}", slug(keyword), i + 1);
            ListingEntry {
                path: format!("/download/{arch}/{name}"),
                name,
                size_kb: rng.gen_range(12..=48_000),
                records: rng.gen_range(100..=250_000),
            }
        })
        .collect()
}

/// Transport-neutral response.
#[derive(Debug, Clone)]
pub struct TarpitResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
}

impl TarpitResponse {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    fn html(body: String) -> Self {
        Self::new(200, HTML, body)
    }

    fn json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(200, JSON, serde_json::to_vec_pretty(value)?))
    }

    fn forbidden(message: &str) -> Self {
        Self::new(403, TEXT, message)
    }

    /// Served when a bot response cannot be built.
    pub fn fallback(archetype_id: &str) -> Self {
        Self::new(
            200,
            TEXT,
            format!("Data for {archetype_id} is being prepared. Please retry shortly.\n"),
        )
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Per-request entry point tying classification, statistics and generation together.
pub struct TarpitService {
    classifier: Classifier,
    engine: TarpitEngine,
    config: Arc<ConfigStore>,
    stats: Arc<Statistics>,
    artifacts: ArtifactGenerator,
    cache: ArtifactCache,
    debug_headers: bool,
}

impl TarpitService {
    pub fn new(
        registry: Arc<ArchetypeRegistry>,
        config: Arc<ConfigStore>,
        stats: Arc<Statistics>,
        cache: &CacheConfig,
        debug_headers: bool,
    ) -> Self {
        Self {
            classifier: Classifier::new(Arc::clone(&registry)),
            engine: TarpitEngine::new(registry, Arc::clone(&stats)),
            config,
            stats,
            artifacts: ArtifactGenerator::new(),
            cache: ArtifactCache::new(
                cache.artifact_cache_size,
                std::time::Duration::from_secs(cache.artifact_cache_ttl_seconds),
            ),
            debug_headers,
        }
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Handle a request with a fresh entropy-seeded RNG.
    pub async fn handle(&self, ctx: &RequestContext) -> TarpitResponse {
        let mut rng = StdRng::from_entropy();
        self.handle_with_rng(ctx, &mut rng).await
    }

    /// Handle a request with a caller-supplied RNG.
    pub async fn handle_with_rng(&self, ctx: &RequestContext, rng: &mut StdRng) -> TarpitResponse {
        self.stats.record(StatsEvent::Request);
        let classification = self.classifier.classify_request(ctx);
        let config = self.config.snapshot();

        let mut response = if classification.is_bot() {
            let id = classification.archetype_id.as_str();
            self.stats.record(StatsEvent::BotHit(id.to_string()));
            let targeted = config.is_targeted(id);
            if targeted {
                self.stats.record(StatsEvent::TargetedHit);
            }

            info!(
                archetype = %id,
                matched_by = classification.matched_by.as_str(),
                path = %ctx.path,
                method = %ctx.method,
                client_ip = ?ctx.client_ip,
                targeted = targeted,
                "Bot request classified"
            );

            match self.bot(ctx, id, &config, rng).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(archetype = %id, path = %ctx.path, error = %e, "Trap generation failed, serving fallback");
                    TarpitResponse::fallback(id)
                }
            }
        } else {
            debug!(path = %ctx.path, method = %ctx.method, client_ip = ?ctx.client_ip, "Human request");
            self.human(ctx)
        };

        if self.debug_headers {
            add_debug_headers(&mut response, &classification);
        }
        response
    }

    fn human(&self, ctx: &RequestContext) -> TarpitResponse {
        if ctx.path.starts_with("/download/") {
            return TarpitResponse::forbidden("Downloads are not available.\n");
        }
        TarpitResponse::html(self.engine.build_human_response())
    }

    async fn bot(
        &self,
        ctx: &RequestContext,
        id: &str,
        config: &TargetingConfig,
        rng: &mut StdRng,
    ) -> Result<TarpitResponse> {
        let path = ctx.path.as_str();

        if path.starts_with("/download/") {
            return self.download(path, id, config, rng).await;
        }
        if let Some(api) = path.strip_prefix("/api/") {
            return self.api(api, ctx, id, config, rng);
        }

        let depth = effective_depth(ctx, config);
        let lead = if path == "/bait/list" || path.starts_with("/archive/") || path.starts_with("/data/") {
            PageLead::Listing
        } else if ctx.method == "POST" {
            PageLead::Submission
        } else {
            PageLead::None
        };

        let page = self.engine.build_page(id, config, depth, lead, rng)?;
        Ok(TarpitResponse::html(page.document))
    }

    async fn download(
        &self,
        path: &str,
        id: &str,
        config: &TargetingConfig,
        rng: &mut StdRng,
    ) -> Result<TarpitResponse> {
        if !config.download_traps {
            return Ok(TarpitResponse::forbidden("Downloads are disabled.\n"));
        }

        let format = DOWNLOAD_PATH
            .captures(path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| "txt".to_string());

        let key = (id.to_string(), format.clone());
        let artifact = self
            .cache
            .get_or_generate(key, || self.artifacts.generate(&format, id, &config.keywords, rng))
            .await?;

        let filename = requested_filename(path).unwrap_or(&artifact.filename);
        self.stats.record(StatsEvent::Download(id.to_string()));
        info!(
            archetype = %id,
            filename = %filename,
            bytes = artifact.bytes.len(),
            cached_artifacts = self.cache.entry_count(),
            "Download served"
        );

        let mut response = TarpitResponse::new(200, artifact.content_type, artifact.bytes.clone());
        response.headers.push((
            "content-disposition",
            format!("attachment; filename=\"{filename}\""),
        ));
        Ok(response)
    }

    fn api(
        &self,
        api: &str,
        ctx: &RequestContext,
        id: &str,
        config: &TargetingConfig,
        rng: &mut StdRng,
    ) -> Result<TarpitResponse> {
        let envelope = self.engine.envelope(id, config, rng)?;
        let keywords = &envelope.keywords;
        let arch = slug(id);
        let now = Utc::now();

        let value = if api.starts_with("data") {
            let page: u32 = ctx
                .query_param("page")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1)
                .max(1);
            let items: Vec<_> = (0..rng.gen_range(10..=50))
                .map(|i| {
                    json!({
                        "id": i,
                        "title": format!("{} Item {i}", title_case(&keywords[rng.gen_range(0..keywords.len())])),
                        "content": format!("Generated content for {id} crawlers"),
                        "keywords": sample(keywords, 3, rng),
                        "created_at": (now - Duration::days(rng.gen_range(0..=30))).to_rfc3339(),
                    })
                })
                .collect();
            json!({
                "status": "success",
                "archetype": id,
                "data": {
                    "items": items,
                    "pagination": {
                        "page": page,
                        "total_pages": rng.gen_range(10..=100),
                        "next_page": format!("/api/data?page={}&archetype={arch}", page + 1),
                    },
                },
                "generated_at": now.to_rfc3339(),
                "download_url": format!("/download/{arch}/full_dataset.zip"),
            })
        } else if api.starts_with("analytics") {
            json!({
                "archetype": id,
                "analytics": {
                    "total_requests": rng.gen_range(1_000..=10_000),
                    "unique_visitors": rng.gen_range(100..=1_000),
                    "popular_keywords": sample(keywords, 5, rng),
                    "downloads": rng.gen_range(50..=500),
                    "avg_session_duration": format!("{}m {}s", rng.gen_range(1..=10), rng.gen_range(0..60)),
                },
                "recommendations": [
                    format!("Increase {} content", keywords[rng.gen_range(0..keywords.len())]),
                    "Add more interactive elements",
                    "Generate additional dataset variations",
                ],
            })
        } else {
            json!({
                "error": "Invalid API endpoint",
                "available_endpoints": ["/api/data", "/api/analytics", "/api/downloads"],
                "timestamp": now.to_rfc3339(),
            })
        };

        TarpitResponse::json(&value)
    }
}

/// Frame depth for this request: the configured maximum, lowered by `?depth=`.
fn effective_depth(ctx: &RequestContext, config: &TargetingConfig) -> u32 {
    ctx.query_param("depth")
        .and_then(|d| d.parse::<u32>().ok())
        .map_or(config.recursion_depth, |d| d.min(config.recursion_depth))
}

/// Last path segment of a download URL, when it is a plain file name.
fn requested_filename(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    })
}

fn sample<R: Rng + ?Sized>(keywords: &[String], max: usize, rng: &mut R) -> Vec<String> {
    keywords
        .choose_multiple(rng, max.min(keywords.len()))
        .cloned()
        .collect()
}

fn add_debug_headers(response: &mut TarpitResponse, classification: &ClassificationResult) {
    response
        .headers
        .push(("x-tarpit-archetype", classification.archetype_id.clone()));
    response.headers.push((
        "x-tarpit-matched-by",
        classification.matched_by.as_str().to_string(),
    ));
}
