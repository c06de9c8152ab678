//! Request classification.
//!
//! Maps a (User-Agent, path) pair to an archetype id by ordered substring
//! containment:
//! - identity patterns of every archetype, in registration order
//! - then path patterns of every archetype, in registration order
//! - otherwise [`ids::GENERIC`]

use crate::archetypes::{ids, ArchetypeRegistry};
use axum::extract::Query;
use axum::http::Uri;
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Request information needed by the tar pit.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request headers (lowercase keys)
    pub headers: HashMap<String, Vec<String>>,
    /// Client IP address, when the transport knows it
    pub client_ip: Option<IpAddr>,
    /// Request path without the query string
    pub path: String,
    /// Percent-decoded query parameters
    pub query: HashMap<String, String>,
    /// HTTP method
    pub method: String,
}

impl RequestContext {
    /// Build a context for a bare GET without headers.
    pub fn get(target: &str) -> Self {
        let (path, query) = match target.parse::<Uri>() {
            Ok(uri) => (
                uri.path().to_string(),
                Query::try_from_uri(&uri)
                    .map(|Query(params)| params)
                    .unwrap_or_default(),
            ),
            Err(_) => (target.to_string(), HashMap::new()),
        };
        Self {
            headers: HashMap::new(),
            client_ip: None,
            path,
            query,
            method: "GET".to_string(),
        }
    }

    /// Set a header, replacing existing values.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), vec![value.into()]);
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_uppercase();
        self
    }

    /// Get a single header value (first if multiple).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// Get the User-Agent header.
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Get a query parameter value.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// What produced a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "pattern", rename_all = "snake_case")]
pub enum MatchedBy {
    /// An identity pattern matched the User-Agent
    Identity(String),
    /// A path pattern matched the request path
    Path(String),
    /// Nothing matched
    None,
}

impl MatchedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedBy::Identity(_) => "identity",
            MatchedBy::Path(_) => "path",
            MatchedBy::None => "none",
        }
    }
}

/// Classification outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// Archetype id or [`ids::GENERIC`]
    pub archetype_id: String,
    /// Diagnostics only
    pub matched_by: MatchedBy,
}

impl ClassificationResult {
    /// Result for humans and unrecognized clients.
    pub fn generic() -> Self {
        Self {
            archetype_id: ids::GENERIC.to_string(),
            matched_by: MatchedBy::None,
        }
    }

    /// Whether the request goes down the bot branch.
    pub fn is_bot(&self) -> bool {
        self.archetype_id != ids::GENERIC
    }
}

/// Read-only classifier over a shared registry.
#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<ArchetypeRegistry>,
}

impl Classifier {
    pub fn new(registry: Arc<ArchetypeRegistry>) -> Self {
        Self { registry }
    }

    /// Classify an identity string and path.
    pub fn classify(&self, identity: &str, path: &str) -> ClassificationResult {
        if let Some((id, pattern)) = self.registry.match_identity(&identity.to_lowercase()) {
            return ClassificationResult {
                archetype_id: id.to_string(),
                matched_by: MatchedBy::Identity(pattern.to_string()),
            };
        }

        if let Some((id, pattern)) = self.registry.match_path(&path.to_lowercase()) {
            return ClassificationResult {
                archetype_id: id.to_string(),
                matched_by: MatchedBy::Path(pattern.to_string()),
            };
        }

        ClassificationResult::generic()
    }

    /// Classify a request. A missing User-Agent is treated as empty.
    pub fn classify_request(&self, ctx: &RequestContext) -> ClassificationResult {
        self.classify(ctx.user_agent().unwrap_or(""), &ctx.path)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Arc::new(ArchetypeRegistry::with_defaults()))
    }
}
