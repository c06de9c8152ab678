//! Tar pit for automated crawlers.
//!
//! Classifies each request into a crawler archetype (or "human") and answers bots
//! with keyword-saturated synthetic documents, recursive links, nested frames and
//! bait downloads, while humans get a plain page.
//!
//! # Pipeline
//!
//! - [`Classifier`] maps User-Agent and path to an archetype
//! - [`ContentGenerator`] builds a themed [`ContentEnvelope`]
//! - [`TrapComposer`] attaches a [`TrapBundle`]
//! - [`TarpitService`] routes the request and records [`Statistics`]
//!
//! # Example
//!
//! ```ignore
//! use zentinel_tarpit::{server, ArchetypeRegistry, ConfigStore, Statistics, TarpitService};
//!
//! let service = TarpitService::new(
//!     Arc::new(ArchetypeRegistry::with_defaults()),
//!     Arc::new(ConfigStore::new(config.targeting)?),
//!     Arc::new(Statistics::new()),
//!     &config.cache,
//!     false,
//! );
//! let app = server::router(Arc::new(service), None);
//! ```

pub mod archetypes;
pub mod artifacts;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod content;
pub mod error;
pub mod render;
pub mod router;
pub mod server;
pub mod stats;
pub mod traps;

pub use archetypes::{ArchetypeRegistry, ArchetypeSignature};
pub use artifacts::{Artifact, ArtifactGenerator};
pub use classifier::{ClassificationResult, Classifier, MatchedBy, RequestContext};
pub use config::{ConfigStore, TarpitConfig, TargetingConfig};
pub use content::{ContentEnvelope, ContentGenerator};
pub use error::{ConfigError, RegistryError, TarpitError};
pub use router::{BotResponse, FormatOffer, TarpitEngine, TarpitResponse, TarpitService};
pub use stats::{StatsEvent, StatsSnapshot, Statistics};
pub use traps::{TrapBundle, TrapComposer};
