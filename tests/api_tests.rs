use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use raffler::config::Config;
use tower::ServiceExt;

/// Default admin credentials seeded by migration (must match
/// m20250301_initial.rs)
const ADMIN_EMAIL: &str = "admin@raffler.local";
const ADMIN_PASSWORD: &str = "change-me-now";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled in-memory SQLite gives each connection its own database.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Keep functional tests clear of the login quota.
    config.rate_limit.login_per_minute = 100;

    let state = raffler::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    raffler::api::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = spawn_app().await;

    for uri in ["/api/employees", "/api/raffle/weights", "/api/system/audit"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/employees")
                .header("Authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Health check stays public.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let app = spawn_app().await;

    // Wrong password and unknown account look identical to a caller.
    for (email, password) in [
        (ADMIN_EMAIL, "wrong-password"),
        ("nobody@raffler.local", ADMIN_PASSWORD),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_login_rate_limit() {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.rate_limit.login_per_minute = 3;

    let state = raffler::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let app = raffler::api::router(state);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_employee_lifecycle() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            Some(&token),
            serde_json::json!({ "name": "Ada Lovelace", "department": "Engineering" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    // Duplicate name conflicts.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            Some(&token),
            serde_json::json!({ "name": "Ada Lovelace" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/employees/{id}/entries"),
            Some(&token),
            serde_json::json!({ "activity_name": "Demo day", "entries": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["new_total"], 4);

    // Out-of-range award is rejected without touching the total.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/employees/{id}/entries"),
            Some(&token),
            serde_json::json!({ "activity_name": "Demo day", "entries": 11 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/employees/{id}/reset"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["previous_total"], 4);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/employees/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Soft-deleted employees disappear from the listing.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/employees")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_viewer_cannot_mutate() {
    let app = spawn_app().await;
    let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            Some(&admin_token),
            serde_json::json!({
                "email": "viewer@raffler.local",
                "password": "viewer-password",
                "role": "viewer",
                "display_name": "Viewer",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let viewer_token = login(&app, "viewer@raffler.local", "viewer-password").await;

    // Reads are allowed.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/employees")
                .header("Authorization", format!("Bearer {viewer_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Mutations are not.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            Some(&viewer_token),
            serde_json::json!({ "name": "Grace Hopper" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/system/reset-all",
            Some(&viewer_token),
            serde_json::json!({ "confirmation": "RESET_ALL_DATA" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reset_all_requires_exact_confirmation() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    for confirmation in ["", "reset_all_data", "RESET ALL DATA", "RESET_ALL_DATA "] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/system/reset-all",
                Some(&token),
                serde_json::json!({ "confirmation": confirmation }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{confirmation:?}");
    }
}

#[tokio::test]
async fn test_raffle_weights_and_winner() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let mut ids = Vec::new();
    for (name, entries) in [("Alice", 1), ("Bob", 3)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/employees",
                Some(&token),
                serde_json::json!({ "name": name }),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["id"].as_i64().unwrap();
        ids.push(id);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/employees/{id}/entries"),
                Some(&token),
                serde_json::json!({ "activity_name": "Kickoff", "entries": entries }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/raffle/weights")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let weights = body["data"].as_array().unwrap();
    assert_eq!(weights.len(), 2);
    assert_eq!(weights[0]["name"], "Alice");
    assert_eq!(weights[0]["probability"], 25.0);
    assert_eq!(weights[1]["probability"], 75.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/raffle/winner",
            Some(&token),
            serde_json::json!({
                "winner_id": ids[1],
                "prize": "Coffee voucher",
                "total_participants": 2,
                "total_entries_at_draw": 4,
                "winning_chance": 75.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["winner_name"], "Bob");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/raffle/history")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Recording a winner never mutates totals.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/raffle/weights")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_names_filters_junk() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/import/names",
            Some(&token),
            serde_json::json!({
                "names": ["Ada Lovelace", "Al", "None", "12345", "Grace Hopper"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["added"], 2);
    assert_eq!(body["data"]["skipped"], 3);
}

#[tokio::test]
async fn test_audit_trail_is_recorded() {
    let app = spawn_app().await;
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/employees",
            Some(&token),
            serde_json::json!({ "name": "Ada Lovelace" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/audit?page=0&page_size=50")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let actions: Vec<&str> = body["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["action"].as_str())
        .collect();

    assert!(actions.contains(&"User login"));
    assert!(actions.contains(&"Added employee"));
}
