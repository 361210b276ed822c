//! Audit recorder.
//!
//! Persists one audit log entry per mutation. Recording never fails the
//! caller's primary operation: every refusal or storage error comes back as
//! [`RecordOutcome::NotRecorded`] and is logged here.

use std::sync::Arc;

use super::context_cache::ContextCache;
use super::diff::generate_change_summary;
use super::ports::{with_timeout, ActorProvider, AuditLogStore};
use super::settings::AuditSettings;
use crate::errors::AuditError;
use crate::models::{
    AuditAction, AuditLogEntry, AuditSubject, Department, Employee, NewAuditLogEntry,
    RecordAuditInput, RequestContext, Snapshot,
};

/// Result of a `record` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded(AuditLogEntry),
    /// The entry was not written; the reason is informational only.
    NotRecorded(AuditError),
}

impl RecordOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, RecordOutcome::Recorded(_))
    }

    pub fn entry(&self) -> Option<&AuditLogEntry> {
        match self {
            RecordOutcome::Recorded(entry) => Some(entry),
            RecordOutcome::NotRecorded(_) => None,
        }
    }

    pub fn into_entry(self) -> Option<AuditLogEntry> {
        match self {
            RecordOutcome::Recorded(entry) => Some(entry),
            RecordOutcome::NotRecorded(_) => None,
        }
    }

    /// Label used for the `outcome` dimension of recording metrics.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            RecordOutcome::Recorded(_) => "recorded",
            RecordOutcome::NotRecorded(reason) => reason.code(),
        }
    }
}

pub struct AuditRecorder {
    store: Arc<dyn AuditLogStore>,
    context: Arc<ContextCache>,
    settings: AuditSettings,
}

impl AuditRecorder {
    pub fn new(
        store: Arc<dyn AuditLogStore>,
        context: Arc<ContextCache>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            store,
            context,
            settings,
        }
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    /// Records one action on behalf of the caller in `ctx`.
    pub async fn record(&self, ctx: &RequestContext, input: RecordAuditInput) -> RecordOutcome {
        if !self.settings.enabled {
            tracing::debug!(action = %input.action, "Audit logging disabled, skipping");
            return RecordOutcome::NotRecorded(AuditError::FeatureDisabled);
        }

        let Some(actor) = ctx.current_actor() else {
            tracing::debug!(action = %input.action, "No authenticated actor, skipping audit entry");
            return RecordOutcome::NotRecorded(AuditError::Unauthenticated);
        };

        if let Err(reason) = input.check_invariants() {
            tracing::warn!(
                action = %input.action,
                target_type = %input.target_type,
                reason = %reason,
                "Refusing to record malformed audit entry"
            );
            return RecordOutcome::NotRecorded(AuditError::InvalidEntry(reason));
        }

        let ip_address = self.context.get_network_origin().await;
        let session_id = self.context.session_token(ctx.session_key.as_deref());

        let change_summary = match input.change_summary {
            Some(summary) => summary,
            None => generate_change_summary(
                self.settings.locale,
                input.action,
                input.target_type,
                input.target_name.as_deref(),
                input.before_data.as_ref(),
                input.after_data.as_ref(),
            ),
        };

        let entry = NewAuditLogEntry {
            organization_id: ctx.organization_id.clone(),
            actor,
            action: input.action,
            target_type: input.target_type,
            target_id: input.target_id,
            target_name: input.target_name,
            before_data: input.before_data,
            after_data: input.after_data,
            change_summary,
            ip_address,
            user_agent: ctx.user_agent.clone(),
            session_id: Some(session_id),
            metadata: input.metadata,
        };
        let action = entry.action;
        let target_type = entry.target_type;

        match with_timeout(self.settings.io_timeout, self.store.insert(entry)).await {
            Ok(stored) => {
                tracing::info!(
                    entry_id = %stored.id,
                    organization_id = %stored.organization_id,
                    action = %stored.action,
                    target_type = %stored.target_type,
                    "Audit log entry recorded"
                );
                RecordOutcome::Recorded(stored)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    action = %action,
                    target_type = %target_type,
                    "Failed to record audit log entry"
                );
                RecordOutcome::NotRecorded(e.into())
            }
        }
    }

    /// Records an action against an employee.
    ///
    /// The employee becomes `afterData` unless the action is a delete.
    pub async fn record_employee_action(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        employee: &Employee,
        before_data: Option<Snapshot>,
    ) -> RecordOutcome {
        self.record(ctx, subject_input(action, employee, before_data))
            .await
    }

    /// Records an action against a department.
    pub async fn record_department_action(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        department: &Department,
        before_data: Option<Snapshot>,
    ) -> RecordOutcome {
        self.record(ctx, subject_input(action, department, before_data))
            .await
    }
}

/// Builds the `record` input the typed wrappers submit.
pub fn subject_input<S: AuditSubject>(
    action: AuditAction,
    subject: &S,
    before_data: Option<Snapshot>,
) -> RecordAuditInput {
    RecordAuditInput {
        action,
        target_type: S::TARGET_TYPE,
        target_id: subject.subject_id(),
        target_name: subject.subject_name(),
        before_data,
        after_data: (action != AuditAction::Delete).then(|| subject.to_snapshot()),
        change_summary: None,
        metadata: None,
    }
}
