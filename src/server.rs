//! HTTP transport.
//!
//! Every GET/POST path is handled by the tar pit. The optional status route
//! serves the statistics snapshot as JSON.

use crate::classifier::RequestContext;
use crate::router::{TarpitResponse, TarpitService};
use crate::stats::StatsSnapshot;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TarpitService>,
}

/// Build the axum router.
pub fn router(service: Arc<TarpitService>, status_path: Option<&str>) -> Router {
    let state = AppState { service };
    let mut app = Router::new();
    if let Some(path) = status_path {
        app = app.route(path, get(status));
    }
    app.fallback(trap)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.service.stats().snapshot())
}

async fn trap(
    State(state): State<AppState>,
    client: Option<ConnectInfo<SocketAddr>>,
    query: Option<Query<HashMap<String, String>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let query = query.map(|Query(params)| params).unwrap_or_default();
    let ctx = request_context(
        &method,
        &uri,
        &headers,
        query,
        client.map(|ConnectInfo(addr)| addr),
    );
    to_response(state.service.handle(&ctx).await)
}

/// Convert an HTTP request head into a [`RequestContext`].
pub fn request_context(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    client: Option<SocketAddr>,
) -> RequestContext {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());
        }
    }

    RequestContext {
        headers: map,
        client_ip: client.map(|addr| addr.ip()),
        path: uri.path().to_string(),
        query,
        method: method.as_str().to_string(),
    }
}

fn to_response(tarpit: TarpitResponse) -> Response {
    let status = StatusCode::from_u16(tarpit.status).unwrap_or(StatusCode::OK);
    let mut response = (status, tarpit.body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(tarpit.content_type));
    for (name, value) in tarpit.headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::ArchetypeRegistry;
    use crate::config::{CacheConfig, ConfigStore, TargetingConfig};
    use crate::render::HUMAN_PAGE;
    use crate::stats::Statistics;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(debug_headers: bool) -> Router {
        let service = TarpitService::new(
            Arc::new(ArchetypeRegistry::with_defaults()),
            Arc::new(ConfigStore::new(TargetingConfig::default()).unwrap()),
            Arc::new(Statistics::new()),
            &CacheConfig::default(),
            debug_headers,
        );
        router(Arc::new(service), Some("/_tarpit/status"))
    }

    async fn body_string(resp: Response) -> String {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_human_request() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("user-agent", "Mozilla/5.0 Firefox/121.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("x-tarpit-archetype").is_none());
        assert_eq!(body_string(resp).await, HUMAN_PAGE);
    }

    #[tokio::test]
    async fn test_bot_request_with_debug_headers() {
        let resp = test_router(true)
            .oneshot(
                Request::builder()
                    .uri("/ai/intro?depth=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-tarpit-archetype"], "model-trainer");
        assert_eq!(resp.headers()["x-tarpit-matched-by"], "path");
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert!(body_string(resp).await.contains("?depth=0"));
    }

    #[tokio::test]
    async fn test_encoded_depth_is_decoded() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .uri("/ai/intro?depth=%30")
                    .header("user-agent", "GPTBot/1.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!body_string(resp).await.contains("tp-frame"));
    }

    #[tokio::test]
    async fn test_download_response() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .uri("/download/model-trainer/corpus.zip")
                    .header("user-agent", "ClaudeBot/1.0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/zip");
        assert!(resp.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("filename=\"corpus.zip\""));
    }

    #[tokio::test]
    async fn test_post_is_trapped() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/contact")
                    .header("user-agent", "GPTBot/1.1")
                    .body(Body::from("name=x"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("submission_dataset.zip"));
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_status_route() {
        let resp = test_router(false)
            .oneshot(
                Request::builder()
                    .uri("/_tarpit/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(value["total_requests"], 0);
    }

    #[test]
    fn test_request_context_conversion() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("GPTBot"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("*/*"));
        let uri: Uri = "/dataset/42?depth=2".parse().unwrap();
        let addr: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let query = HashMap::from([("depth".to_string(), "2".to_string())]);

        let ctx = request_context(&Method::GET, &uri, &headers, query, Some(addr));
        assert_eq!(ctx.path, "/dataset/42");
        assert_eq!(ctx.query_param("depth"), Some("2"));
        assert_eq!(ctx.user_agent(), Some("GPTBot"));
        assert_eq!(ctx.headers["accept"].len(), 2);
        assert_eq!(ctx.client_ip.unwrap().to_string(), "10.0.0.1");
    }
}
