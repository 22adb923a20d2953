//! `SeaORM` implementation of the `LedgerService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use crate::db::{AnalyticsSummary, AuditEntry, NewEmployee, Store};
use crate::entities::{activities, employees, raffle_history};
use crate::services::backup::BackupCoordinator;
use crate::services::ledger_service::{
    Actor, LedgerError, LedgerService, RESET_ALL_CONFIRMATION, RaffleWeight, ResetAllReport,
    WinnerRecord,
};
use crate::services::rate_limit::{RateLimiter, RateScope};

const RECENT_ACTIVITIES_PER_EMPLOYEE: u64 = 10;

pub struct SeaOrmLedgerService {
    store: Store,
    backup: Arc<BackupCoordinator>,
    limiter: Arc<RateLimiter>,
}

impl SeaOrmLedgerService {
    #[must_use]
    pub const fn new(store: Store, backup: Arc<BackupCoordinator>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            store,
            backup,
            limiter,
        }
    }

    /// The business fact is already committed when this runs; losing the
    /// audit entry is logged operationally but never reverses the mutation.
    async fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self.store.append_audit(entry).await {
            error!("Failed to write audit log entry: {e:#}");
        }
    }
}

#[async_trait]
impl LedgerService for SeaOrmLedgerService {
    async fn list_employees(
        &self,
    ) -> Result<Vec<(employees::Model, Vec<activities::Model>)>, LedgerError> {
        Ok(self
            .store
            .list_active_employees(RECENT_ACTIVITIES_PER_EMPLOYEE)
            .await?)
    }

    async fn add_employee(&self, new: NewEmployee, actor: &Actor) -> Result<i32, LedgerError> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "Employee name is required".to_string(),
            ));
        }

        if let Some(email) = new.email.as_deref() {
            let email = email.trim();
            if !email.is_empty() && !email.contains('@') {
                return Err(LedgerError::Validation("Invalid email format".to_string()));
            }
        }

        let new = NewEmployee { name, ..new };

        let Some(employee_id) = self.store.add_employee(&new).await? else {
            return Err(LedgerError::DuplicateEmployee);
        };

        self.audit(
            AuditEntry::new("Added employee")
                .actor(actor.user_id)
                .table("employees", i64::from(employee_id))
                .new_values(json!({ "name": new.name, "department": new.department }))
                .ip(&actor.source_address),
        )
        .await;

        Ok(employee_id)
    }

    async fn award_entries(
        &self,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        count: i32,
        notes: Option<&str>,
        actor: &Actor,
    ) -> Result<i32, LedgerError> {
        if activity_name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Activity name is required".to_string(),
            ));
        }

        if !(1..=10).contains(&count) {
            return Err(LedgerError::InvalidEntryCount);
        }

        let new_total = self
            .store
            .award_entries(
                employee_id,
                activity_name.trim(),
                activity_category.trim(),
                count,
                actor.user_id,
                notes,
            )
            .await?
            .ok_or(LedgerError::EmployeeNotFound)?;

        self.audit(
            AuditEntry::new(format!("Added {count} raffle entries"))
                .actor(actor.user_id)
                .table("employees", i64::from(employee_id))
                .new_values(json!({
                    "activity": activity_name,
                    "entries": count,
                    "new_total": new_total,
                }))
                .ip(&actor.source_address),
        )
        .await;

        Ok(new_total)
    }

    async fn reset_employee(&self, employee_id: i32, actor: &Actor) -> Result<i32, LedgerError> {
        let old_total = self
            .store
            .reset_employee(employee_id, actor.user_id)
            .await?
            .ok_or(LedgerError::EmployeeNotFound)?;

        self.audit(
            AuditEntry::new("Reset employee points")
                .actor(actor.user_id)
                .table("employees", i64::from(employee_id))
                .old_values(json!({ "total_entries": old_total }))
                .new_values(json!({ "total_entries": 0 }))
                .ip(&actor.source_address),
        )
        .await;

        Ok(old_total)
    }

    async fn soft_delete_employee(
        &self,
        employee_id: i32,
        actor: &Actor,
    ) -> Result<String, LedgerError> {
        let snapshot = self
            .store
            .soft_delete_employee(employee_id)
            .await?
            .ok_or(LedgerError::EmployeeNotFound)?;

        self.audit(
            AuditEntry::new("Deleted employee (soft delete)")
                .actor(actor.user_id)
                .table("employees", i64::from(employee_id))
                .old_values(json!({ "name": snapshot.name }))
                .ip(&actor.source_address),
        )
        .await;

        Ok(snapshot.name)
    }

    async fn reset_all(
        &self,
        confirmation: &str,
        actor: &Actor,
    ) -> Result<ResetAllReport, LedgerError> {
        // The confirmation gate comes first: a wrong literal must leave no
        // trace, not even a rate-limiter consumption or audit entry.
        if confirmation != RESET_ALL_CONFIRMATION {
            return Err(LedgerError::InvalidConfirmation);
        }

        // Snapshot before touching anything; a failed backup aborts the
        // reset entirely.
        let backup_path = self.backup.snapshot().await?;
        let backup_file = backup_path
            .file_name()
            .map_or_else(|| backup_path.display().to_string(), |n| n.to_string_lossy().to_string());

        // The rate-limit slot is taken only once the snapshot has landed; a
        // failed backup leaves the quota untouched.
        if !self
            .limiter
            .try_acquire(RateScope::ResetAll, &actor.source_address)
        {
            return Err(LedgerError::RateLimited);
        }

        let summary = self.store.reset_all_employees(actor.user_id).await?;

        warn!(
            "SYSTEM RESET by user {}: {} employees, {} entries cleared (backup: {})",
            actor.user_id, summary.employees_reset, summary.entries_cleared, backup_file
        );

        self.audit(
            AuditEntry::new("SYSTEM RESET - All employee data reset")
                .actor(actor.user_id)
                .new_values(json!({
                    "backup_file": backup_file,
                    "employees_reset": summary.employees_reset,
                    "entries_cleared": summary.entries_cleared,
                }))
                .ip(&actor.source_address),
        )
        .await;

        Ok(ResetAllReport {
            backup_file,
            employees_reset: summary.employees_reset,
            entries_cleared: summary.entries_cleared,
        })
    }

    async fn compute_raffle_weights(&self) -> Result<Vec<RaffleWeight>, LedgerError> {
        let eligible = self.store.eligible_employees().await?;

        let total: i64 = eligible.iter().map(|e| i64::from(e.total_entries)).sum();
        if total == 0 {
            return Ok(Vec::new());
        }

        #[allow(clippy::cast_precision_loss)]
        let weights = eligible
            .into_iter()
            .map(|e| {
                let chance = f64::from(e.total_entries) / total as f64 * 100.0;
                RaffleWeight {
                    employee_id: e.id,
                    name: e.name,
                    entries: e.total_entries,
                    probability: (chance * 100.0).round() / 100.0,
                }
            })
            .collect();

        Ok(weights)
    }

    async fn record_winner(
        &self,
        record: WinnerRecord,
        actor: &Actor,
    ) -> Result<(i32, String), LedgerError> {
        let (raffle_id, winner_name) = self
            .store
            .record_raffle_winner(
                record.winner_id,
                &record.prize,
                record.total_participants,
                record.total_entries_at_draw,
                record.winning_chance,
                actor.user_id,
            )
            .await?
            .ok_or(LedgerError::InvalidWinner)?;

        info!("Raffle conducted, winner: {winner_name}");

        self.audit(
            AuditEntry::new(format!("Conducted raffle - Winner: {winner_name}"))
                .actor(actor.user_id)
                .table("raffle_history", i64::from(raffle_id))
                .new_values(json!({
                    "winner": winner_name,
                    "prize": record.prize,
                    "participants": record.total_participants,
                }))
                .ip(&actor.source_address),
        )
        .await;

        Ok((raffle_id, winner_name))
    }

    async fn raffle_history(&self) -> Result<Vec<raffle_history::Model>, LedgerError> {
        Ok(self.store.raffle_history().await?)
    }

    async fn analytics(&self) -> Result<AnalyticsSummary, LedgerError> {
        Ok(self.store.analytics().await?)
    }
}
