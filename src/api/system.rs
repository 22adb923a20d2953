use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::entities::audit_log;
use crate::services::{
    Actor, AuthenticatedUser, Operation, ResetAllReport, Role, authorize,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct ResetAllRequest {
    pub confirmation: String,
}

#[derive(Serialize)]
pub struct BackupResponse {
    pub backup_file: String,
}

#[derive(Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub action: Option<String>,
}

const fn default_page_size() -> u64 {
    50
}

#[derive(Serialize)]
pub struct AuditPage {
    pub entries: Vec<audit_log::Model>,
    pub total_pages: u64,
    pub page: u64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub database_ok: bool,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /system/reset-all
///
/// Admin-only bulk wipe, double-gated: the allow-list here plus the exact
/// confirmation literal checked inside the service.
pub async fn reset_all(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<ResetAllRequest>,
) -> Result<Json<ApiResponse<ResetAllReport>>, ApiError> {
    authorize(current.role, Operation::ResetAll)?;

    let actor = Actor {
        user_id: current.user_id,
        role: current.role,
        source_address: current.source_address.clone(),
    };

    let report = state
        .shared
        .ledger
        .reset_all(&payload.confirmation, &actor)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

/// POST /system/backup
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<BackupResponse>>, ApiError> {
    authorize(current.role, Operation::CreateBackup)?;

    let path = state.shared.backup.snapshot().await?;

    Ok(Json(ApiResponse::success(BackupResponse {
        backup_file: path.display().to_string(),
    })))
}

/// GET /system/audit
pub async fn export_audit(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<ApiResponse<AuditPage>>, ApiError> {
    authorize(current.role, Operation::ExportAudit)?;

    let page_size = query.page_size.clamp(1, 500);
    let (entries, total_pages) = state
        .shared
        .store
        .list_audit(query.page, page_size, query.action)
        .await?;

    Ok(Json(ApiResponse::success(AuditPage {
        entries,
        total_pages,
        page: query.page,
    })))
}

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<StatusResponse>> {
    let database_ok = state.shared.store.ping().await.is_ok();

    Json(ApiResponse::success(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database_ok,
    }))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<AuthenticatedUser>>, ApiError> {
    authorize(current.role, Operation::ManageUsers)?;

    let user = state
        .shared
        .auth
        .create_user(
            &payload.email,
            &payload.password,
            payload.role,
            &payload.display_name,
            current.user_id,
        )
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{id}
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    authorize(current.role, Operation::ManageUsers)?;

    if id == current.user_id {
        return Err(ApiError::validation("Cannot deactivate your own account"));
    }

    state.shared.auth.deactivate_user(id, current.user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deactivated".to_string(),
    })))
}
