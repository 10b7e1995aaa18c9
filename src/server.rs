//! HTTP server: release attestations plus health and metrics endpoints
//!
//! - `GET /?transaction_id=N` - 65-byte release signature (application/cbor)
//! - `GET /health`  - JSON status
//! - `GET /healthz` - liveness
//! - `GET /metrics` - Prometheus metrics

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::attestor::ReleaseAttestor;
use crate::error::BridgeError;
use crate::metrics::{self, ReleaseResult};
use crate::watcher::WatermarkHandle;

pub const CBOR_CONTENT_TYPE: &str = "application/cbor";

#[derive(Clone)]
pub struct AppState {
    pub attestor: Arc<ReleaseAttestor>,
    pub watermark: WatermarkHandle,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseQuery {
    transaction_id: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub watermark: u64,
    pub mints_submitted: u64,
    pub releases_signed: u64,
    pub releases_rejected: u64,
}

/// HTTP status for a failed release request
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::TransactionNotFound { .. } => StatusCode::NOT_FOUND,
        BridgeError::TransactionNotSuccessful { .. }
        | BridgeError::InvalidArguments { .. }
        | BridgeError::UnsupportedPrecision { .. }
        | BridgeError::AmountOverflow { .. } => StatusCode::BAD_REQUEST,
        BridgeError::ChainRpcFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn release(State(state): State<AppState>, Query(query): Query<ReleaseQuery>) -> Response {
    let raw = match query.transaction_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return (StatusCode::NOT_FOUND, "transaction_id is required").into_response(),
    };

    let transaction_id: u32 = match raw.parse() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                format!("transaction_id must be a u32, got '{}'", raw),
            )
                .into_response()
        }
    };

    match state.attestor.attest(transaction_id).await {
        Ok(signature) => (
            [(header::CONTENT_TYPE, CBOR_CONTENT_TYPE)],
            signature.as_bytes().to_vec(),
        )
            .into_response(),
        Err(e) => (status_for(&e), e.to_string()).into_response(),
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        watermark: state.watermark.get(),
        mints_submitted: metrics::MINTS_SUBMITTED.get(),
        releases_signed: metrics::releases(ReleaseResult::Signed),
        releases_rejected: metrics::releases(ReleaseResult::Rejected),
    })
}

/// Liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(release))
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/metrics", get(prometheus_metrics))
        .layer(cors)
        .with_state(state)
}

/// Serve on an already-bound listener
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> eyre::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Release server listening on {}", addr);
    info!("  /?transaction_id=N - Release signature");
    info!("  /health  - Full health status (JSON)");
    info!("  /metrics - Prometheus metrics");

    serve(listener, state).await
}
