use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
pub mod employees;
mod error;
pub mod raffle;
pub mod system;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/health", get(health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/employees", get(employees::list_employees))
        .route("/employees", post(employees::add_employee))
        .route("/employees/{id}/entries", post(employees::award_entries))
        .route("/employees/{id}/reset", post(employees::reset_employee))
        .route("/employees/{id}", delete(employees::delete_employee))
        .route("/import/names", post(employees::import_names))
        .route("/analytics/dashboard", get(employees::analytics_dashboard))
        .route("/raffle/weights", get(raffle::get_weights))
        .route("/raffle/winner", post(raffle::record_winner))
        .route("/raffle/history", get(raffle::get_history))
        .route("/system/reset-all", post(system::reset_all))
        .route("/system/backup", post(system::create_backup))
        .route("/system/audit", get(system::export_audit))
        .route("/system/status", get(system::get_status))
        .route("/users", post(system::create_user))
        .route("/users/{id}", delete(system::deactivate_user))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
