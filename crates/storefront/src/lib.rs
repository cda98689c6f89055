//! Tindahan ni Lola storefront library.
//!
//! Server-rendered store management UI: product catalog, a session cart with
//! printable receipts, and a ledger of customer debts. Everything except the
//! binary's start-up lives here so the integration tests can serve the exact
//! same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{
    LatencyUnit,
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::backend::{Backend, MemoryBackend, SupabaseBackend};
use crate::config::{BackendKind, ConfigError, StorefrontConfig};
use crate::state::AppState;

/// Directory holding the stylesheet and fallback image.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Construct the backend selected by the configuration.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if the hosted backend is selected
/// without its project settings.
pub fn build_backend(config: &StorefrontConfig) -> Result<Arc<dyn Backend>, ConfigError> {
    match config.backend {
        BackendKind::Supabase => {
            let supabase = config
                .supabase
                .as_ref()
                .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;
            Ok(Arc::new(SupabaseBackend::new(supabase)))
        }
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}

/// Build the full application router.
///
/// Sentry layers are not included; the binary wraps them around this so they
/// sit outermost.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let security = state.security_headers().clone();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        })
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn_with_state(
            security,
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().health().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(
                backend = state.backend().backend_tag(),
                error = %e,
                "Readiness check failed"
            );
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
