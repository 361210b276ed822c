//! Audit log routes.
//!
//! Browsing, recording and rollback of org chart audit log entries. Every
//! handler is scoped to the caller's organization by the [`AuditCaller`]
//! extractor.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::models::{
    AuditAction, Department, Employee, ListAuditLogsQuery, Metadata, RecordAuditInput, Snapshot,
    TargetType,
};
use domain::services::{RecordOutcome, RollbackApplied};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuditCaller;
use crate::middleware::metrics::{record_audit_entry, record_rollback};

/// Create audit logs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_audit_logs).post(record_audit_log))
        .route("/count", get(count_audit_logs))
        .route("/employees", post(record_employee_action))
        .route("/departments", post(record_department_action))
        .route("/:log_id", get(get_audit_log))
        .route("/:log_id/rollback", post(rollback_audit_log))
}

/// Body of `POST /audit-logs`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordAuditRequest {
    pub action: AuditAction,
    pub target_type: TargetType,
    #[validate(length(min = 1, max = 255, message = "targetId must be 1-255 characters"))]
    pub target_id: Option<String>,
    #[validate(length(max = 255, message = "targetName must be at most 255 characters"))]
    pub target_name: Option<String>,
    #[serde(default)]
    pub before_data: Option<Snapshot>,
    #[serde(default)]
    pub after_data: Option<Snapshot>,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "changeSummary must be 1-2000 characters"
    ))]
    pub change_summary: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl From<RecordAuditRequest> for RecordAuditInput {
    fn from(request: RecordAuditRequest) -> Self {
        RecordAuditInput {
            action: request.action,
            target_type: request.target_type,
            target_id: request.target_id,
            target_name: request.target_name,
            before_data: request.before_data,
            after_data: request.after_data,
            change_summary: request.change_summary,
            metadata: request.metadata,
        }
    }
}

/// Body of `POST /audit-logs/employees`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeActionRequest {
    pub action: AuditAction,
    pub employee: Employee,
    #[serde(default)]
    pub before_data: Option<Snapshot>,
}

/// Body of `POST /audit-logs/departments`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentActionRequest {
    pub action: AuditAction,
    pub department: Department,
    #[serde(default)]
    pub before_data: Option<Snapshot>,
}

/// Reply when a `record` call did not persist anything.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotRecordedResponse {
    pub recorded: bool,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResponse {
    pub success: bool,
    pub original_entry_id: Uuid,
    pub applied: RollbackApplied,
    /// Absent when the rollback itself could not be recorded.
    pub rollback_entry_id: Option<Uuid>,
}

/// 201 with the entry, or 202 with the reason nothing was written.
fn record_response(outcome: RecordOutcome) -> Response {
    record_audit_entry(outcome.outcome_label());

    match outcome {
        RecordOutcome::Recorded(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        RecordOutcome::NotRecorded(reason) => (
            StatusCode::ACCEPTED,
            Json(NotRecordedResponse {
                recorded: false,
                reason: reason.code().to_string(),
                message: reason.to_string(),
            }),
        )
            .into_response(),
    }
}

/// List audit logs with filtering and pagination.
#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.audit.query.list_page(&ctx, &query).await?;

    Ok((StatusCode::OK, Json(page)))
}

/// Count audit logs matching the filters. Paging parameters are ignored.
#[axum::debug_handler]
pub async fn count_audit_logs(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let total = state.audit.query.count(&ctx, &query.criteria()).await?;

    Ok(Json(CountResponse { total }))
}

/// Get a specific audit log entry.
#[axum::debug_handler]
pub async fn get_audit_log(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Path(log_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.audit.query.get_by_id(&ctx, log_id).await?;

    Ok(Json(entry))
}

/// Record an audit log entry.
#[axum::debug_handler]
pub async fn record_audit_log(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Json(request): Json<RecordAuditRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;

    let outcome = state.audit.recorder.record(&ctx, request.into()).await;

    Ok(record_response(outcome))
}

/// Record an action against an employee.
#[axum::debug_handler]
pub async fn record_employee_action(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Json(request): Json<EmployeeActionRequest>,
) -> Result<Response, ApiError> {
    let outcome = state
        .audit
        .recorder
        .record_employee_action(&ctx, request.action, &request.employee, request.before_data)
        .await;

    Ok(record_response(outcome))
}

/// Record an action against a department.
#[axum::debug_handler]
pub async fn record_department_action(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Json(request): Json<DepartmentActionRequest>,
) -> Result<Response, ApiError> {
    let outcome = state
        .audit
        .recorder
        .record_department_action(
            &ctx,
            request.action,
            &request.department,
            request.before_data,
        )
        .await;

    Ok(record_response(outcome))
}

/// Roll back the mutation an audit log entry describes.
#[axum::debug_handler]
pub async fn rollback_audit_log(
    State(state): State<AppState>,
    AuditCaller(ctx): AuditCaller,
    Path(log_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    match state.audit.rollback.rollback(&ctx, log_id).await {
        Ok(outcome) => {
            record_rollback("success");
            tracing::info!(
                entry_id = %outcome.original_entry_id,
                entity_id = %outcome.applied.entity_id(),
                "Audit log entry rolled back"
            );

            Ok(Json(RollbackResponse {
                success: true,
                original_entry_id: outcome.original_entry_id,
                rollback_entry_id: outcome.rollback_entry.as_ref().map(|e| e.id),
                applied: outcome.applied,
            }))
        }
        Err(e) => {
            record_rollback(e.code());
            tracing::warn!(entry_id = %log_id, error_code = e.code(), "Rollback refused: {}", e);
            Err(e.into())
        }
    }
}
