use std::sync::Arc;

use raffler::config::{RateLimitConfig, SecurityConfig};
use raffler::db::Store;
use raffler::services::{
    AuthError, AuthService, RateLimiter, Role, SeaOrmAuthService, TokenSigner,
};

fn test_security(lockout_seconds: i64) -> SecurityConfig {
    SecurityConfig {
        // Keep hashing cheap; these tests exercise the state machine, not
        // the KDF.
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        lockout_seconds,
        ..SecurityConfig::default()
    }
}

async fn auth_service(lockout_seconds: i64) -> (SeaOrmAuthService, Store) {
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store");

    let signer = Arc::new(TokenSigner::new("test-secret", 30));
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        login_per_minute: 100,
        ..RateLimitConfig::default()
    }));

    let service = SeaOrmAuthService::new(
        store.clone(),
        signer,
        limiter,
        test_security(lockout_seconds),
    );

    (service, store)
}

async fn seed_user(store: &Store, email: &str, password: &str) -> i32 {
    store
        .create_user(email, password, "manager", "Test User", &test_security(900))
        .await
        .expect("Failed to create user")
        .id
}

#[tokio::test]
async fn test_lockout_blocks_even_the_correct_password() {
    let (auth, store) = auth_service(900).await;
    seed_user(&store, "ada@example.com", "correct-password").await;

    for _ in 0..3 {
        let err = auth
            .login("ada@example.com", "wrong-password", "test")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Threshold reached; the right password is now indistinguishable from
    // a wrong one until the lockout elapses.
    let err = auth
        .login("ada@example.com", "correct-password", "test")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_lockout_expires_and_counter_resets() {
    let (auth, store) = auth_service(1).await;
    seed_user(&store, "ada@example.com", "correct-password").await;

    for _ in 0..3 {
        let _ = auth.login("ada@example.com", "wrong-password", "test").await;
    }

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let user = auth
        .login("ada@example.com", "correct-password", "test")
        .await
        .expect("login should succeed after the lockout elapses");
    assert_eq!(user.email, "ada@example.com");

    // The counter restarted from zero: two fresh failures must not lock.
    for _ in 0..2 {
        let _ = auth.login("ada@example.com", "wrong-password", "test").await;
    }
    auth.login("ada@example.com", "correct-password", "test")
        .await
        .expect("two failures are below the threshold");
}

#[tokio::test]
async fn test_unknown_and_inactive_users_fail_identically() {
    let (auth, store) = auth_service(900).await;
    let id = seed_user(&store, "ada@example.com", "correct-password").await;
    store.deactivate_user(id).await.unwrap();

    for email in ["ada@example.com", "ghost@example.com"] {
        let err = auth.login(email, "correct-password", "test").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials), "{email}");
    }
}

#[tokio::test]
async fn test_email_lookup_is_case_insensitive() {
    let (auth, store) = auth_service(900).await;
    seed_user(&store, "ada@example.com", "correct-password").await;

    let user = auth
        .login("  ADA@Example.COM ", "correct-password", "test")
        .await
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.role, Role::Manager);
}

#[tokio::test]
async fn test_issued_token_round_trips() {
    let (auth, store) = auth_service(900).await;
    seed_user(&store, "ada@example.com", "correct-password").await;

    let user = auth
        .login("ada@example.com", "correct-password", "test")
        .await
        .unwrap();

    let token = auth.issue_token(&user).unwrap();
    let claims = auth.verify_token(&token).expect("token should verify");
    assert_eq!(claims.sub, user.id);
    assert_eq!(claims.role, Role::Manager);

    assert!(auth.verify_token("garbage").is_none());
}

#[tokio::test]
async fn test_change_password() {
    let (auth, store) = auth_service(900).await;
    let id = seed_user(&store, "ada@example.com", "correct-password").await;

    let err = auth
        .change_password(id, "wrong-password", "brand-new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let err = auth
        .change_password(id, "correct-password", "short")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    auth.change_password(id, "correct-password", "brand-new-password")
        .await
        .unwrap();

    let err = auth
        .login("ada@example.com", "correct-password", "test")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    auth.login("ada@example.com", "brand-new-password", "test")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_user_validation() {
    let (auth, _store) = auth_service(900).await;

    let err = auth
        .create_user("not-an-email", "long-enough-password", Role::Viewer, "X", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let err = auth
        .create_user("eve@example.com", "short", Role::Viewer, "Eve", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    auth.create_user("eve@example.com", "long-enough-password", Role::Viewer, "Eve", 1)
        .await
        .unwrap();

    let err = auth
        .create_user("eve@example.com", "long-enough-password", Role::Viewer, "Eve", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
}
