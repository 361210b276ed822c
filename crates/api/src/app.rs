use axum::{middleware, routing::get, Router};
use domain::services::{
    AuditBackends, AuditService, EntityRepositories, InMemorySessionStore,
};
use persistence::repositories::{AuditLogRepository, PgEntityRepository};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, ConfigValidationError};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{audit_logs, health};
use crate::services::HttpOriginLookup;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub audit: Arc<AuditService>,
    pub jwt: Arc<JwtConfig>,
    /// Absent when the audit services run on in-memory collaborators.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: Config,
        backends: AuditBackends,
        pool: Option<PgPool>,
    ) -> Result<Self, ConfigValidationError> {
        let settings = config.audit.settings()?;
        let jwt = config.jwt.build()?;

        Ok(Self {
            config: Arc::new(config),
            audit: Arc::new(AuditService::new(backends, settings)),
            jwt: Arc::new(jwt),
            pool,
        })
    }
}

/// PostgreSQL-backed collaborators plus the HTTP origin lookup.
///
/// Session tokens are process-local.
pub fn postgres_backends(
    config: &Config,
    pool: &PgPool,
) -> Result<AuditBackends, ConfigValidationError> {
    let origin_lookup =
        HttpOriginLookup::new(&config.audit.origin_lookup_url, config.audit.io_timeout())
            .map_err(|e| {
                ConfigValidationError::InvalidValue(format!("audit.origin_lookup_url: {}", e))
            })?;

    Ok(AuditBackends {
        store: Arc::new(AuditLogRepository::new(pool.clone())),
        repositories: EntityRepositories::new(
            Arc::new(PgEntityRepository::employees(pool.clone())),
            Arc::new(PgEntityRepository::departments(pool.clone())),
        ),
        origin_lookup: Arc::new(origin_lookup),
        sessions: Arc::new(InMemorySessionStore::new()),
    })
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, ConfigValidationError> {
    let backends = postgres_backends(&config, &pool)?;
    let state = AppState::new(config, backends, Some(pool))?;
    Ok(router(state))
}

/// Routes and global middleware over a prepared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    let api_routes = Router::new().nest("/api/v1/audit-logs", audit_logs::router());

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
