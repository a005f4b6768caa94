//! robohub/crates/rh-api/src/middleware.rs Middleware
//!
//! Tower layers for request tracing and CORS, plus the request body cap.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method, Request};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer settings read from configuration.
#[derive(Debug, Clone, Copy)]
pub struct MiddlewareConfig {
    pub max_upload_bytes: usize,
    pub cors_allow_any_origin: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            cors_allow_any_origin: true,
        }
    }
}

// Configures CORS (Cross-Origin Resource Sharing).
// Only relevant when the UI is served from another origin.
pub fn cors_policy(allow_any_origin: bool) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));
    if allow_any_origin {
        cors.allow_origin(Any)
    } else {
        cors
    }
}

/// Wraps the router with the standard layer stack. The request id is set
/// before the trace span opens so every log line of a request carries it.
pub fn apply<S>(router: Router<S>, config: MiddlewareConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        info_span!("request", method = %req.method(), uri = %req.uri(), request_id)
    });

    // Replaces the 2 MB extractor default with the configured cap.
    router.layer(DefaultBodyLimit::max(config.max_upload_bytes)).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
            .layer(trace)
            .layer(PropagateRequestIdLayer::new(request_id_header))
            .layer(cors_policy(config.cors_allow_any_origin)),
    )
}
