//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: HealthComponents,
    pub metrics: HealthMetrics,
}

#[derive(Serialize)]
pub struct HealthComponents {
    pub store: bool,
    pub generator: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub stored_workflows: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    // Counting doubles as a store liveness check
    let stored = state.engine.store().len();
    let store_healthy = stored.is_ok();

    let status = if store_healthy { "healthy" } else { "degraded" };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: HealthComponents {
            store: store_healthy,
            generator: state.engine.generator_name().to_string(),
        },
        metrics: HealthMetrics {
            stored_workflows: stored.unwrap_or(0),
        },
    })
}
