//! `SeaORM` implementation of the `AuthService` trait.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::{parse_lockout, verify_password};
use crate::db::{AuditEntry, Store};
use crate::entities::users;
use crate::services::access::Role;
use crate::services::auth_service::{AuthError, AuthService, AuthenticatedUser};
use crate::services::rate_limit::{RateLimiter, RateScope};
use crate::services::token::{Claims, TokenSigner};

pub struct SeaOrmAuthService {
    store: Store,
    signer: Arc<TokenSigner>,
    limiter: Arc<RateLimiter>,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        signer: Arc<TokenSigner>,
        limiter: Arc<RateLimiter>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            signer,
            limiter,
            security,
        }
    }

    fn map_user(model: &users::Model) -> Result<AuthenticatedUser, AuthError> {
        let role = Role::from_str(&model.role)
            .map_err(|()| AuthError::Internal(format!("Unknown role in store: {}", model.role)))?;

        Ok(AuthenticatedUser {
            id: model.id,
            email: model.email.clone(),
            display_name: model.display_name.clone(),
            role,
        })
    }

    /// Audit writes on the auth path are best-effort: losing one must not
    /// turn a valid login into a failure.
    async fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self.store.append_audit(entry).await {
            error!("Failed to write audit log entry: {e:#}");
        }
    }

    async fn record_failure(&self, user: &users::Model, source_address: &str) -> Result<(), AuthError> {
        let locked = self
            .store
            .record_login_failure(
                user.id,
                self.security.max_login_attempts,
                self.security.lockout_seconds,
            )
            .await?;

        if locked {
            warn!("Account locked after repeated failures: user_id={}", user.id);
            self.audit(
                AuditEntry::new("Account locked after repeated failed logins")
                    .actor(user.id)
                    .ip(source_address),
            )
            .await;
        } else {
            self.audit(
                AuditEntry::new("Failed login attempt")
                    .actor(user.id)
                    .ip(source_address),
            )
            .await;
        }

        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
        source_address: &str,
    ) -> Result<AuthenticatedUser, AuthError> {
        // Quota check comes before any storage access.
        if !self.limiter.try_acquire(RateScope::Login, source_address) {
            return Err(AuthError::RateLimited);
        }

        let email = email.trim().to_lowercase();

        let Some(user) = self.store.get_user_by_email(&email).await? else {
            // Unknown account: same generic failure as a bad password.
            return Err(AuthError::InvalidCredentials);
        };

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();
        if let Some(locked_until) = parse_lockout(user.locked_until.as_deref()) {
            if locked_until > now {
                // A locked attempt neither consumes a failure-counter
                // increment nor extends the lockout.
                return Err(AuthError::InvalidCredentials);
            }
            // Window elapsed: clear on the first attempt afterwards.
            self.store.clear_login_failures(user.id).await?;
        }

        let is_valid = verify_password(password, &user.password_hash).await?;

        if !is_valid {
            self.record_failure(&user, source_address).await?;
            return Err(AuthError::InvalidCredentials);
        }

        self.store.clear_login_failures(user.id).await?;

        self.audit(
            AuditEntry::new("User login")
                .actor(user.id)
                .ip(source_address),
        )
        .await;

        Self::map_user(&user)
    }

    fn issue_token(&self, user: &AuthenticatedUser) -> Result<String, AuthError> {
        self.signer
            .issue(user.id, user.role)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    fn verify_token(&self, token: &str) -> Option<Claims> {
        self.signer.verify(token)
    }

    async fn logout(&self, user_id: i32, source_address: &str) -> Result<(), AuthError> {
        self.audit(
            AuditEntry::new("User logout")
                .actor(user_id)
                .ip(source_address),
        )
        .await;

        Ok(())
    }

    async fn get_user(&self, user_id: i32) -> Result<AuthenticatedUser, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let role = Role::from_str(&user.role)
            .map_err(|()| AuthError::Internal(format!("Unknown role in store: {}", user.role)))?;

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role,
        })
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let record = self
            .store
            .get_user_by_email(&user.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid = verify_password(current_password, &record.password_hash).await?;
        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .set_user_password(user_id, new_password, &self.security)
            .await?;

        self.audit(AuditEntry::new("Password changed").actor(user_id))
            .await;

        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
        display_name: &str,
        actor: i32,
    ) -> Result<AuthenticatedUser, AuthError> {
        let email = email.trim().to_lowercase();

        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }

        if password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::Validation("Email already in use".to_string()));
        }

        let user = self
            .store
            .create_user(&email, password, role.as_str(), display_name, &self.security)
            .await?;

        self.audit(
            AuditEntry::new("Created user")
                .actor(actor)
                .table("users", i64::from(user.id))
                .new_values(json!({ "email": user.email, "role": role.as_str() })),
        )
        .await;

        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role,
        })
    }

    async fn deactivate_user(&self, user_id: i32, actor: i32) -> Result<(), AuthError> {
        let found = self.store.deactivate_user(user_id).await?;
        if !found {
            return Err(AuthError::UserNotFound);
        }

        self.audit(
            AuditEntry::new("Deactivated user")
                .actor(actor)
                .table("users", i64::from(user_id)),
        )
        .await;

        Ok(())
    }
}
