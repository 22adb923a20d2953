use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, EmployeeDto, MessageResponse};
use crate::db::{AnalyticsSummary, NewEmployee};
use crate::services::{Actor, ImportReport, Operation, authorize};

fn actor(current: &CurrentUser) -> Actor {
    Actor {
        user_id: current.user_id,
        role: current.role,
        source_address: current.source_address.clone(),
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct AddEmployeeRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Serialize)]
pub struct AddEmployeeResponse {
    pub id: i32,
}

#[derive(Deserialize)]
pub struct AwardEntriesRequest {
    pub activity_name: String,
    #[serde(default = "default_category")]
    pub activity_category: String,
    pub entries: i32,
    pub notes: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Serialize)]
pub struct AwardEntriesResponse {
    pub new_total: i32,
}

#[derive(Serialize)]
pub struct ResetEmployeeResponse {
    pub previous_total: i32,
}

#[derive(Deserialize)]
pub struct ImportNamesRequest {
    pub names: Vec<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /employees
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<EmployeeDto>>>, ApiError> {
    authorize(current.role, Operation::ListEmployees)?;

    let employees = state.shared.ledger.list_employees().await?;

    let dtos = employees
        .into_iter()
        .map(|(employee, activities)| EmployeeDto::from_model(employee, activities))
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /employees
pub async fn add_employee(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<AddEmployeeRequest>,
) -> Result<Json<ApiResponse<AddEmployeeResponse>>, ApiError> {
    authorize(current.role, Operation::AddEmployee)?;

    let new = NewEmployee {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        department: payload.department,
        position: payload.position,
    };

    let id = state.shared.ledger.add_employee(new, &actor(&current)).await?;

    Ok(Json(ApiResponse::success(AddEmployeeResponse { id })))
}

/// POST /employees/{id}/entries
pub async fn award_entries(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<AwardEntriesRequest>,
) -> Result<Json<ApiResponse<AwardEntriesResponse>>, ApiError> {
    authorize(current.role, Operation::AwardEntries)?;

    let new_total = state
        .shared
        .ledger
        .award_entries(
            id,
            &payload.activity_name,
            &payload.activity_category,
            payload.entries,
            payload.notes.as_deref(),
            &actor(&current),
        )
        .await?;

    Ok(Json(ApiResponse::success(AwardEntriesResponse { new_total })))
}

/// POST /employees/{id}/reset
pub async fn reset_employee(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ResetEmployeeResponse>>, ApiError> {
    authorize(current.role, Operation::ResetEmployee)?;

    let previous_total = state
        .shared
        .ledger
        .reset_employee(id, &actor(&current))
        .await?;

    Ok(Json(ApiResponse::success(ResetEmployeeResponse {
        previous_total,
    })))
}

/// DELETE /employees/{id}
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    authorize(current.role, Operation::DeleteEmployee)?;

    let name = state
        .shared
        .ledger
        .soft_delete_employee(id, &actor(&current))
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Employee {name} removed"),
    })))
}

/// POST /import/names
pub async fn import_names(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<ImportNamesRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    authorize(current.role, Operation::ImportNames)?;

    let report = state
        .shared
        .importer
        .import_names(&payload.names, &actor(&current))
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

/// GET /analytics/dashboard
pub async fn analytics_dashboard(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>, ApiError> {
    authorize(current.role, Operation::ViewAnalytics)?;

    let summary = state.shared.ledger.analytics().await?;

    Ok(Json(ApiResponse::success(summary)))
}
