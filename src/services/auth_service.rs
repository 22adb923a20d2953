//! Domain service for credential verification and session tokens.
//!
//! Handles login with brute-force lockout, token issuance/verification,
//! password changes, and user administration.

use serde::Serialize;
use thiserror::Error;

use crate::services::access::Role;
use crate::services::token::Claims;

/// Errors specific to authentication operations.
///
/// Login failures are deliberately collapsed into [`AuthError::InvalidCredentials`]
/// whether the account is missing, inactive, locked, or the password is
/// wrong, so callers cannot enumerate accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage unavailable, retry later")]
    StorageUnavailable,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(_) => Self::StorageUnavailable,
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sea_orm::DbErr>() {
            Ok(db_err) => db_err.into(),
            Err(other) => Self::Internal(other.to_string()),
        }
    }
}

/// Identity record returned on successful authentication. Never carries the
/// password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials for one login attempt from `source_address`.
    ///
    /// Consults the rate limiter first, honors the lockout state machine,
    /// and audits both failed and successful attempts.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for every credential-side
    /// failure and [`AuthError::RateLimited`] when the source's attempt
    /// quota is exhausted.
    async fn login(
        &self,
        email: &str,
        password: &str,
        source_address: &str,
    ) -> Result<AuthenticatedUser, AuthError>;

    /// Issues a signed session token for an authenticated user.
    fn issue_token(&self, user: &AuthenticatedUser) -> Result<String, AuthError>;

    /// Verifies a session token. Pure function of the token and the server
    /// secret; no storage access. Fails closed.
    fn verify_token(&self, token: &str) -> Option<Claims>;

    /// Records a logout in the audit trail. Tokens are stateless, so this
    /// does not invalidate anything server-side.
    async fn logout(&self, user_id: i32, source_address: &str) -> Result<(), AuthError>;

    /// Gets the identity record for a user id.
    async fn get_user(&self, user_id: i32) -> Result<AuthenticatedUser, AuthError>;

    /// Changes a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is wrong
    /// or the new password is invalid.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Creates a user account (admin operation).
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        display_name: &str,
        actor: i32,
    ) -> Result<AuthenticatedUser, AuthError>;

    /// Deactivates a user account. Users are never physically deleted.
    async fn deactivate_user(&self, user_id: i32, actor: i32) -> Result<(), AuthError>;
}
