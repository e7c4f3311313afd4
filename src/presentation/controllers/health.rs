//! Health check and metrics controller

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;

use crate::metrics;
use crate::presentation::controllers::AppState;
use crate::presentation::models::HealthResponse;

const UP: &str = "UP";
const DOWN: &str = "DOWN";

fn health(status: &str, details: Option<serde_json::Value>) -> HealthResponse {
    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        details,
    }
}

/// Basic health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(health(UP, None))
}

/// Detailed health: database connectivity and cache statistics
#[utoipa::path(
    get,
    path = "/actuator/health",
    tag = "health",
    responses(
        (status = 200, description = "All components are up", body = HealthResponse),
        (status = 503, description = "A component is down", body = HealthResponse)
    )
)]
pub async fn detailed_health_check(State(app_state): State<AppState>) -> Response {
    let start_time = Instant::now();

    let db = match app_state.users.ping().await {
        Ok(()) => json!({ "status": UP }),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            json!({ "status": DOWN, "error": e.to_string() })
        }
    };
    let db_up = db["status"] == UP;

    let mut caches = serde_json::Map::new();
    for (name, stats) in app_state.caches.stats().await {
        caches.insert(
            name.to_string(),
            json!({
                "hits": stats.hits,
                "misses": stats.misses,
                "evictions": stats.evictions,
                "entries": stats.total_entries,
                "hit_rate": stats.hit_rate(),
            }),
        );
    }

    let status = if db_up { UP } else { DOWN };
    let response = health(
        status,
        Some(json!({
            "db": db,
            "caches": { "status": UP, "details": caches },
            "check_duration_ms": start_time.elapsed().as_millis(),
            "build_info": {
                "version": env!("CARGO_PKG_VERSION"),
                "build_date": option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
            }
        })),
    );

    let code = if db_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response)).into_response()
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/actuator/health/liveness",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness_probe() -> Json<HealthResponse> {
    Json(health(UP, None))
}

/// Readiness probe; ready once the database answers
#[utoipa::path(
    get,
    path = "/actuator/health/readiness",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready to accept traffic", body = HealthResponse),
        (status = 503, description = "Service is not ready", body = HealthResponse)
    )
)]
pub async fn readiness_probe(State(app_state): State<AppState>) -> Response {
    match app_state.users.ping().await {
        Ok(()) => Json(health(UP, None)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(health(DOWN, None))).into_response(),
    }
}

/// Prometheus text exposition
#[utoipa::path(
    get,
    path = "/actuator/prometheus",
    tag = "health",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain")
    )
)]
pub async fn prometheus(State(app_state): State<AppState>) -> Response {
    // refresh the entry gauges before exporting
    app_state.caches.stats().await;

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
        .into_response()
}
