//! Health check endpoints
//!
//! - /health, /healthz - liveness probe (is the service running?)
//! - /ready, /readyz   - readiness probe (can it reach MongoDB?)
//! - /version          - build information for deployment verification
//!
//! In dev mode the service may run without MongoDB; readiness reports
//! degraded instead of failing outright so local frontends keep working.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Health response consumed by deployment probes and the dashboard
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' or 'degraded' for UI display
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: String,
    /// MongoDB connection status
    pub mongo: MongoHealth,
    /// Chain registry status
    pub chain: ChainHealth,
}

#[derive(Serialize)]
pub struct MongoHealth {
    pub connected: bool,
}

#[derive(Serialize)]
pub struct ChainHealth {
    pub configured: bool,
}

fn json(status: StatusCode, body: &impl Serialize) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let mongo_connected = state.mongo.is_some();

    HealthResponse {
        healthy: true,
        status: if mongo_connected { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        mongo: MongoHealth {
            connected: mongo_connected,
        },
        chain: ChainHealth {
            configured: state.chain.is_some(),
        },
    }
}

/// Liveness probe (/health, /healthz): 200 whenever the process runs
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    json(StatusCode::OK, &build_health_response(&state))
}

/// Readiness probe (/ready, /readyz): 200 only when MongoDB answers a
/// ping, unless dev mode allows running without it
pub async fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let ready = match &state.mongo {
        Some(mongo) => mongo.ping().await.is_ok(),
        None => state.args.dev_mode,
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    json(
        status,
        &serde_json::json!({
            "ready": ready,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<Full<Bytes>> {
    json(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            service: "ipsphere",
        },
    )
}
