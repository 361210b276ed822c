//! Common test utilities for integration tests.
//!
//! The router is driven with in-memory collaborators, so no database is
//! needed.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{
    AuditBackends, EntityRepositories, InMemoryAuditLogStore, InMemoryEntityRepository,
    InMemorySessionStore, StaticOriginLookup,
};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use org_audit_api::app::{router, AppState};
use org_audit_api::config::{
    AuditConfig, Config, DatabaseConfig, JwtAuthConfig, LoggingConfig, ServerConfig,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use shared::jwt::Claims;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_jwt_testing_12345";
pub const TEST_ORIGIN: &str = "192.0.2.10";
pub const DEFAULT_ORG: &str = "default";

/// Test configuration with an HS256 secret.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        jwt: JwtAuthConfig {
            algorithm: "hs256".to_string(),
            secret: TEST_JWT_SECRET.to_string(),
            public_key: String::new(),
            leeway_secs: 30,
        },
        audit: AuditConfig {
            enabled: true,
            rollback_enabled: true,
            default_page_size: 50,
            max_page_size: 100,
            origin_lookup_url: "http://127.0.0.1:9/unused".to_string(),
            origin_cache_ttl_secs: 300,
            io_timeout_ms: 5000,
            locale: "en".to_string(),
            verify_current_state: false,
            default_organization_id: DEFAULT_ORG.to_string(),
        },
    }
}

/// Router plus handles on its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryAuditLogStore>,
    pub employees: Arc<InMemoryEntityRepository>,
    pub departments: Arc<InMemoryEntityRepository>,
    pub origin: Arc<StaticOriginLookup>,
}

/// Create a test application router.
pub fn create_test_app(config: Config) -> TestApp {
    let store = Arc::new(InMemoryAuditLogStore::new());
    let employees = Arc::new(InMemoryEntityRepository::new());
    let departments = Arc::new(InMemoryEntityRepository::new());
    let origin = Arc::new(StaticOriginLookup::new(TEST_ORIGIN));

    let backends = AuditBackends {
        store: store.clone(),
        repositories: EntityRepositories::new(employees.clone(), departments.clone()),
        origin_lookup: origin.clone(),
        sessions: Arc::new(InMemorySessionStore::new()),
    };
    let state = AppState::new(config, backends, None).expect("Failed to build app state");

    TestApp {
        router: router(state),
        store,
        employees,
        departments,
        origin,
    }
}

/// Operator identity for tokens.
pub struct TestOperator {
    pub email: String,
    pub name: String,
    pub organization_id: Option<String>,
}

impl TestOperator {
    pub fn new() -> Self {
        Self {
            email: SafeEmail().fake(),
            name: Name().fake(),
            organization_id: Some("org_test".to_string()),
        }
    }

    pub fn in_org(mut self, organization_id: &str) -> Self {
        self.organization_id = Some(organization_id.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn without_org(mut self) -> Self {
        self.organization_id = None;
        self
    }

    /// Signed access token for this operator.
    pub fn token(&self) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            email: self.email.clone(),
            name: Some(self.name.clone()),
            org: self.organization_id.clone(),
            exp: now + 3600,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }
}

impl Default for TestOperator {
    fn default() -> Self {
        Self::new()
    }
}

fn with_auth(
    builder: axum::http::request::Builder,
    token: Option<&str>,
) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    with_auth(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "integration-test/1.0")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(Method::GET).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

pub fn post_request(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::builder().method(Method::POST).uri(uri), token)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}
