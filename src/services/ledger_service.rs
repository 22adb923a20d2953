//! Domain service for the entry ledger: awards, resets, soft deletes,
//! raffle weights, and winner recording. Every mutation is paired with an
//! audit log write.

use serde::Serialize;
use thiserror::Error;

use crate::db::{AnalyticsSummary, NewEmployee};
use crate::entities::{activities, employees, raffle_history};
use crate::services::access::Role;

/// Exact literal required by the bulk-reset confirmation protocol.
pub const RESET_ALL_CONFIRMATION: &str = "RESET_ALL_DATA";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Employee already exists")]
    DuplicateEmployee,

    #[error("Entries must be between 1 and 10")]
    InvalidEntryCount,

    #[error("Invalid winner ID")]
    InvalidWinner,

    #[error("Invalid confirmation")]
    InvalidConfirmation,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Storage unavailable, retry later")]
    StorageUnavailable,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for LedgerError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(_) => Self::StorageUnavailable,
            // SQLite busy/locked (code 5) survives the repository retries
            // only under sustained write contention; it is retryable for
            // the caller, not a data fault.
            other if other.to_string().contains("database is locked") => {
                Self::StorageUnavailable
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sea_orm::DbErr>() {
            Ok(db_err) => db_err.into(),
            Err(other) => Self::Internal(other.to_string()),
        }
    }
}

/// Who is performing a ledger operation, for audit attribution.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
    pub source_address: String,
}

/// One eligible employee's share of the upcoming draw.
#[derive(Debug, Clone, Serialize)]
pub struct RaffleWeight {
    pub employee_id: i32,
    pub name: String,
    pub entries: i32,
    /// Percentage, rounded to two decimals for display.
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetAllReport {
    pub backup_file: String,
    pub employees_reset: u64,
    pub entries_cleared: i64,
}

#[derive(Debug, Clone)]
pub struct WinnerRecord {
    pub winner_id: i32,
    pub prize: String,
    pub total_participants: i32,
    pub total_entries_at_draw: i32,
    pub winning_chance: f64,
}

/// Domain service trait for the entry ledger.
#[async_trait::async_trait]
pub trait LedgerService: Send + Sync {
    /// Active employees with their most recent activity rows.
    async fn list_employees(
        &self,
    ) -> Result<Vec<(employees::Model, Vec<activities::Model>)>, LedgerError>;

    /// Registers an employee.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateEmployee`] when the name or a
    /// non-empty email is already taken.
    async fn add_employee(&self, new: NewEmployee, actor: &Actor) -> Result<i32, LedgerError>;

    /// Awards 1..=10 entries and returns the employee's new total. The
    /// activity row and the total increment commit atomically.
    async fn award_entries(
        &self,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        count: i32,
        notes: Option<&str>,
        actor: &Actor,
    ) -> Result<i32, LedgerError>;

    /// Zeroes one employee's total via a corrective activity row. Returns
    /// the total before the reset.
    async fn reset_employee(&self, employee_id: i32, actor: &Actor) -> Result<i32, LedgerError>;

    /// Soft delete: marks the employee inactive, leaving history intact.
    /// Returns the employee's name.
    async fn soft_delete_employee(
        &self,
        employee_id: i32,
        actor: &Actor,
    ) -> Result<String, LedgerError>;

    /// Bulk reset guarded by the confirmation protocol and a pre-mutation
    /// backup snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidConfirmation`] without side effects
    /// when `confirmation` is not the exact literal.
    async fn reset_all(
        &self,
        confirmation: &str,
        actor: &Actor,
    ) -> Result<ResetAllReport, LedgerError>;

    /// Draw weights over active employees with entries. The draw itself is
    /// out of scope; only its result comes back via [`Self::record_winner`].
    async fn compute_raffle_weights(&self) -> Result<Vec<RaffleWeight>, LedgerError>;

    /// Appends a raffle result. Does not mutate employee or activity state.
    async fn record_winner(
        &self,
        record: WinnerRecord,
        actor: &Actor,
    ) -> Result<(i32, String), LedgerError>;

    async fn raffle_history(&self) -> Result<Vec<raffle_history::Model>, LedgerError>;

    async fn analytics(&self) -> Result<AnalyticsSummary, LedgerError>;
}
