//! Rollback engine.
//!
//! Reverses one recorded create, update or delete by applying its inverse to
//! the target's entity repository, then records the rollback as a new entry.
//!
//! Rollback is a local, single-entity operation and performs an unsynchronized
//! read-modify-write. If the entity changed after the entry was written, an
//! update rollback silently overwrites that change with the older
//! `beforeData` unless `verify_current_state` is enabled.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::diff::{changed_field_keys, rollback_summary};
use super::ports::{
    with_timeout, ActorProvider, AuditLogStore, EntityRepositories, EntityRepository,
};
use super::recorder::{AuditRecorder, RecordOutcome};
use super::settings::AuditSettings;
use crate::errors::{AuditError, StoreError};
use crate::models::{
    AuditAction, AuditLogEntry, Metadata, RecordAuditInput, RequestContext, Snapshot,
    ORIGINAL_ACTION_KEY, ORIGINAL_ENTRY_ID_KEY,
};

/// What the inverse operation did to the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum RollbackApplied {
    /// A created entity was removed.
    Deleted { id: String },
    /// An updated entity was overwritten with its prior fields.
    Restored { id: String },
    /// A deleted entity was created again, possibly under a new id.
    Recreated { id: String },
}

impl RollbackApplied {
    /// Id the entity lives at (or lived at, for `Deleted`) after the rollback.
    pub fn entity_id(&self) -> &str {
        match self {
            RollbackApplied::Deleted { id }
            | RollbackApplied::Restored { id }
            | RollbackApplied::Recreated { id } => id,
        }
    }
}

/// Successful rollback.
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackOutcome {
    pub original_entry_id: Uuid,
    pub applied: RollbackApplied,
    /// The entry describing the rollback, when it could be recorded.
    pub rollback_entry: Option<AuditLogEntry>,
}

/// Validated plan for one rollback.
struct RollbackPlan<'a> {
    entry: &'a AuditLogEntry,
    repository: &'a Arc<dyn EntityRepository>,
}

pub struct RollbackEngine {
    store: Arc<dyn AuditLogStore>,
    repositories: EntityRepositories,
    recorder: Arc<AuditRecorder>,
    settings: AuditSettings,
}

impl RollbackEngine {
    pub fn new(
        store: Arc<dyn AuditLogStore>,
        repositories: EntityRepositories,
        recorder: Arc<AuditRecorder>,
        settings: AuditSettings,
    ) -> Self {
        Self {
            store,
            repositories,
            recorder,
            settings,
        }
    }

    /// Rolls back the entry `entry_id` of the caller's organization.
    pub async fn rollback(
        &self,
        ctx: &RequestContext,
        entry_id: Uuid,
    ) -> Result<RollbackOutcome, AuditError> {
        if !self.settings.rollback_enabled {
            return Err(AuditError::FeatureDisabled);
        }
        if ctx.current_actor().is_none() {
            return Err(AuditError::Unauthenticated);
        }

        let entry = with_timeout(
            self.settings.io_timeout,
            self.store.get_by_id(&ctx.organization_id, entry_id),
        )
        .await?
        .ok_or(AuditError::NotFound)?;

        let plan = self.validate(&entry)?;

        if self.settings.verify_current_state {
            self.verify_current_state(&plan).await?;
        }

        let applied = self.apply(&plan).await.map_err(|e| {
            tracing::error!(
                entry_id = %entry.id,
                action = %entry.action,
                target_type = %entry.target_type,
                error = %e,
                "Rollback apply failed"
            );
            AuditError::StorageFailure(e.to_string())
        })?;

        tracing::info!(
            entry_id = %entry.id,
            action = %entry.action,
            target_type = %entry.target_type,
            entity_id = %applied.entity_id(),
            "Rollback applied"
        );

        let input = rollback_input(&entry, &applied, &self.settings);
        let rollback_entry = match self.recorder.record(ctx, input).await {
            RecordOutcome::Recorded(recorded) => Some(recorded),
            RecordOutcome::NotRecorded(reason) => {
                tracing::warn!(
                    entry_id = %entry.id,
                    reason = %reason,
                    "Rollback applied but its audit entry was not recorded"
                );
                None
            }
        };

        Ok(RollbackOutcome {
            original_entry_id: entry.id,
            applied,
            rollback_entry,
        })
    }

    fn validate<'a>(&'a self, entry: &'a AuditLogEntry) -> Result<RollbackPlan<'a>, AuditError> {
        if !entry.action.is_mutation() {
            return Err(AuditError::UnsupportedAction(entry.action));
        }

        if matches!(entry.action, AuditAction::Update | AuditAction::Delete)
            && entry.before_data.is_none()
        {
            return Err(AuditError::MissingSnapshot);
        }

        let repository = self
            .repositories
            .for_target(entry.target_type)
            .ok_or(AuditError::UnsupportedTargetType(entry.target_type))?;

        if matches!(entry.action, AuditAction::Create | AuditAction::Update)
            && entry.target_id.as_deref().map_or(true, str::is_empty)
        {
            return Err(AuditError::MissingTargetId);
        }

        Ok(RollbackPlan { entry, repository })
    }

    /// Refuses the rollback when the live entity no longer matches `afterData`.
    async fn verify_current_state(&self, plan: &RollbackPlan<'_>) -> Result<(), AuditError> {
        let entry = plan.entry;
        let target_id = match (entry.action, entry.target_id.as_deref()) {
            (AuditAction::Create | AuditAction::Update, Some(id)) => id,
            _ => return Ok(()),
        };

        let lookup = plan.repository.get(target_id);
        let current = match with_timeout(self.settings.io_timeout, lookup).await {
            Ok(current) => current,
            Err(StoreError::NotFound) => {
                return Err(AuditError::Conflict(format!(
                    "{} {} no longer exists",
                    entry.target_type, target_id
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let diverged = changed_field_keys(Some(&current), entry.after_data.as_ref())
            .into_iter()
            .filter(|key| {
                entry
                    .after_data
                    .as_ref()
                    .map_or(false, |after| after.contains_key(*key))
            })
            .collect::<Vec<_>>();

        if !diverged.is_empty() {
            return Err(AuditError::Conflict(format!(
                "fields changed since the entry was recorded: {}",
                diverged.join(", ")
            )));
        }
        Ok(())
    }

    async fn apply(&self, plan: &RollbackPlan<'_>) -> Result<RollbackApplied, StoreError> {
        let entry = plan.entry;
        let repo = plan.repository;
        let timeout = self.settings.io_timeout;
        let target_id = entry.target_id.clone().unwrap_or_default();

        match entry.action {
            AuditAction::Create => {
                with_timeout(timeout, repo.delete(&target_id)).await?;
                Ok(RollbackApplied::Deleted { id: target_id })
            }
            AuditAction::Update => {
                let before = entry.before_data.clone().unwrap_or_default();
                with_timeout(timeout, repo.update(&target_id, before)).await?;
                Ok(RollbackApplied::Restored { id: target_id })
            }
            AuditAction::Delete => {
                let before: Snapshot = entry.before_data.clone().unwrap_or_default();
                let id = with_timeout(timeout, repo.create(before)).await?;
                Ok(RollbackApplied::Recreated { id })
            }
            other => Err(StoreError::Backend(format!(
                "no inverse operation for '{}'",
                other
            ))),
        }
    }
}

/// Entry recorded for a successful rollback: snapshots swapped, metadata
/// pointing back at the reversed entry.
fn rollback_input(
    entry: &AuditLogEntry,
    applied: &RollbackApplied,
    settings: &AuditSettings,
) -> RecordAuditInput {
    let mut metadata = Metadata::new();
    metadata.insert(ORIGINAL_ENTRY_ID_KEY.to_string(), json!(entry.id.to_string()));
    metadata.insert(ORIGINAL_ACTION_KEY.to_string(), json!(entry.action.as_str()));

    RecordAuditInput {
        action: AuditAction::Rollback,
        target_type: entry.target_type,
        target_id: Some(applied.entity_id().to_string()),
        target_name: entry.target_name.clone(),
        before_data: entry.after_data.clone(),
        after_data: entry.before_data.clone(),
        change_summary: Some(rollback_summary(settings.locale, entry.id)),
        metadata: Some(metadata),
    }
}
