//! Error types for the tar pit.
//!
//! None of these are fatal to the process. Bot-branch failures are caught by the
//! router and degrade to the plain-text fallback payload.

use thiserror::Error;

/// Errors raised while building a trap response.
#[derive(Debug, Error)]
pub enum TarpitError {
    /// Content generation could not produce a document
    #[error("content generation failed: {0}")]
    Generation(String),

    /// A synthetic artifact could not be built
    #[error("artifact generation failed for format '{format}': {reason}")]
    Artifact { format: String, reason: String },

    /// JSON encoding of an API payload or structured-data block failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing the HTML document failed
    #[error("render failed: {0}")]
    Render(#[from] std::fmt::Error),
}

impl TarpitError {
    pub fn artifact(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Artifact {
            format: format.into(),
            reason: reason.to_string(),
        }
    }
}

/// Rejected targeting configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one targeting keyword is required")]
    EmptyKeywords,

    #[error("density_multiplier must be a positive finite number, got {0}")]
    InvalidDensity(f64),

    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("sentence range {min}..={max} is invalid")]
    InvalidSentenceRange { min: usize, max: usize },
}

/// Rejected archetype registry definition.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate archetype id '{0}'")]
    DuplicateId(String),

    #[error("archetype '{0}' has neither identity nor path patterns")]
    NoPatterns(String),

    #[error("archetype id must not be empty")]
    EmptyId,

    #[error("archetype id '{0}' is reserved")]
    ReservedId(String),
}

pub type Result<T> = std::result::Result<T, TarpitError>;
