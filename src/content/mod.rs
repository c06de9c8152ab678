//! Procedural text generation.
//!
//! Documents are built from a small sentence grammar over fixed word banks and then
//! saturated with keywords. All randomness comes from a caller-supplied [`rand::Rng`].

pub mod generator;
pub mod lexicon;

pub use generator::{content_hash, ContentEnvelope, ContentGenerator};
