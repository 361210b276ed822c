//! Caller extractor.
//!
//! Resolves the operator behind a request from an optional Bearer token and
//! turns it into the [`RequestContext`] the audit services work with. This is
//! the HTTP side of the actor provider.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use domain::models::{AuditActor, RequestContext};
use shared::jwt::JwtConfig;
use std::convert::Infallible;

use crate::app::AppState;

/// Request context of the caller.
///
/// Never rejects: a missing or invalid token yields a context without an
/// actor, and the audit services decide what an anonymous caller may do.
#[derive(Debug, Clone)]
pub struct AuditCaller(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for AuditCaller {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(AuditCaller(request_context(
            &parts.headers,
            &state.jwt,
            &state.config.audit.default_organization_id,
        )))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Builds the caller's context.
///
/// The tenant is the token's `org` claim, falling back to
/// `default_organization_id`. The token's `jti` keys the session token.
pub fn request_context(
    headers: &HeaderMap,
    jwt: &JwtConfig,
    default_organization_id: &str,
) -> RequestContext {
    let claims = bearer_token(headers).and_then(|token| match jwt.validate_token(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            None
        }
    });

    let organization_id = claims
        .as_ref()
        .and_then(|c| c.org.clone())
        .unwrap_or_else(|| default_organization_id.to_string());
    let mut ctx = RequestContext::new(organization_id);

    if let Some(claims) = claims {
        let actor = AuditActor::new(claims.email.clone(), claims.display_name());
        ctx = ctx.with_actor(actor).with_session_key(claims.jti);
    }

    if let Some(user_agent) = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        ctx = ctx.with_user_agent(user_agent);
    }

    ctx
}
