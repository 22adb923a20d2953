use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AccessError, AuthenticatedUser, Role};

/// Verified request identity, inserted into request extensions by
/// [`auth_middleware`] and consumed by handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i32,
    pub role: Role,
    pub source_address: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires a valid `Authorization: Bearer <token>` header.
///
/// Verification is a pure signature/expiry check; no storage round trip per
/// request. Every failure mode yields the same generic 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(AccessError::Unauthenticated)?;

    let claims = state
        .shared
        .auth
        .verify_token(&token)
        .ok_or(AccessError::Unauthenticated)?;

    let current = CurrentUser {
        user_id: claims.sub,
        role: claims.role,
        source_address: source_address(request.headers()),
    };

    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Best-effort client address for rate limiting and audit attribution.
/// First hop of `X-Forwarded-For` when a proxy supplies it.
pub fn source_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map_or_else(|| "unknown".to_string(), |ip| ip.trim().to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let source = source_address(&headers);

    let user = state
        .shared
        .auth
        .login(&payload.email, &payload.password, &source)
        .await?;

    let token = state.shared.auth.issue_token(&user)?;

    Ok(Json(ApiResponse::success(LoginResponse { token, user })))
}

/// POST /auth/logout
///
/// Tokens are stateless, so this only records the logout in the audit
/// trail; the token remains technically valid until expiry.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth
        .logout(current.user_id, &current.source_address)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<AuthenticatedUser>>, ApiError> {
    let user = state.shared.auth.get_user(current.user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .shared
        .auth
        .change_password(
            current.user_id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!("Password changed for user {}", current.user_id);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}
