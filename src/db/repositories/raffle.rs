use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{employees, prelude::*, raffle_history};

pub struct RaffleRepository {
    conn: DatabaseConnection,
}

impl RaffleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Record a draw result. The draw itself happens outside the ledger;
    /// only the outcome is persisted, and no entry totals change here.
    /// Returns the raffle id and winner name, or `None` when the winner is
    /// not an active employee.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        winner_id: i32,
        prize: &str,
        total_participants: i32,
        total_entries_at_draw: i32,
        winning_chance: f64,
        conducted_by: i32,
    ) -> Result<Option<(i32, String)>> {
        let Some(winner) = Employees::find_by_id(winner_id)
            .filter(employees::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to verify raffle winner")?
        else {
            return Ok(None);
        };

        let active = raffle_history::ActiveModel {
            winner_id: Set(winner_id),
            prize: Set(prize.to_string()),
            total_participants: Set(total_participants),
            total_entries_at_draw: Set(total_entries_at_draw),
            winning_chance: Set(winning_chance),
            conducted_by: Set(conducted_by),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to record raffle result")?;

        Ok(Some((model.id, winner.name)))
    }

    pub async fn history(&self) -> Result<Vec<raffle_history::Model>> {
        let rows = RaffleHistory::find()
            .order_by_desc(raffle_history::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query raffle history")?;

        Ok(rows)
    }
}
