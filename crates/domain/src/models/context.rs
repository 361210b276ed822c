//! Per-request context handed to the audit services.

use super::audit_log::AuditActor;

/// Who is acting, for which organization, and from which browsing session.
///
/// Built by the HTTP layer from the authenticated token and request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub organization_id: String,
    pub actor: Option<AuditActor>,
    /// Stable key for the caller's session. Audit session ids are cached under it.
    pub session_key: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            ..Default::default()
        }
    }

    pub fn with_actor(mut self, actor: AuditActor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.actor.is_some()
    }
}
