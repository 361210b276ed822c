//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub audit: AuditFeatures,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    /// False when the service runs on in-memory collaborators.
    pub configured: bool,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Feature toggles currently in effect.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditFeatures {
    pub recording_enabled: bool,
    pub rollback_enabled: bool,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn ping(pool: &PgPool) -> Option<u64> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .ok()
        .map(|_| start.elapsed().as_millis() as u64)
}

async fn database_health(pool: Option<&PgPool>) -> DatabaseHealth {
    match pool {
        Some(pool) => {
            let latency_ms = ping(pool).await;
            DatabaseHealth {
                configured: true,
                connected: latency_ms.is_some(),
                latency_ms,
            }
        }
        None => DatabaseHealth {
            configured: false,
            connected: false,
            latency_ms: None,
        },
    }
}

/// Full health check endpoint.
///
/// Unhealthy (503) only when a configured database cannot be reached.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let database = database_health(state.pool.as_ref()).await;
    let healthy = !database.configured || database.connected;
    let settings = state.audit.settings();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        audit: AuditFeatures {
            recording_enabled: settings.enabled,
            rollback_enabled: settings.rollback_enabled,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let ready = match &state.pool {
        Some(pool) => ping(pool).await.is_some(),
        None => true,
    };

    if ready {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
