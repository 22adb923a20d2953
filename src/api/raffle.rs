use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState};
use crate::entities::raffle_history;
use crate::services::{Actor, Operation, RaffleWeight, WinnerRecord, authorize};

#[derive(Deserialize)]
pub struct RecordWinnerRequest {
    pub winner_id: i32,
    pub prize: String,
    pub total_participants: i32,
    pub total_entries_at_draw: i32,
    pub winning_chance: f64,
}

#[derive(Serialize)]
pub struct RecordWinnerResponse {
    pub raffle_id: i32,
    pub winner_name: String,
}

/// GET /raffle/weights
///
/// The draw itself happens client-side; the server only exposes the odds
/// and records the outcome.
pub async fn get_weights(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<RaffleWeight>>>, ApiError> {
    authorize(current.role, Operation::ViewRaffleWeights)?;

    let weights = state.shared.ledger.compute_raffle_weights().await?;

    Ok(Json(ApiResponse::success(weights)))
}

/// POST /raffle/winner
pub async fn record_winner(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(payload): Json<RecordWinnerRequest>,
) -> Result<Json<ApiResponse<RecordWinnerResponse>>, ApiError> {
    authorize(current.role, Operation::RecordWinner)?;

    if payload.prize.trim().is_empty() {
        return Err(ApiError::validation("Prize is required"));
    }

    let actor = Actor {
        user_id: current.user_id,
        role: current.role,
        source_address: current.source_address.clone(),
    };

    let record = WinnerRecord {
        winner_id: payload.winner_id,
        prize: payload.prize.trim().to_string(),
        total_participants: payload.total_participants,
        total_entries_at_draw: payload.total_entries_at_draw,
        winning_chance: payload.winning_chance,
    };

    let (raffle_id, winner_name) = state.shared.ledger.record_winner(record, &actor).await?;

    Ok(Json(ApiResponse::success(RecordWinnerResponse {
        raffle_id,
        winner_name,
    })))
}

/// GET /raffle/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<raffle_history::Model>>>, ApiError> {
    authorize(current.role, Operation::ViewRaffleHistory)?;

    let history = state.shared.ledger.raffle_history().await?;

    Ok(Json(ApiResponse::success(history)))
}
