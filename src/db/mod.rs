use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::audit::AuditEntry;
pub use repositories::employee::{AnalyticsSummary, NewEmployee, ResetAllSummary};
pub use repositories::user::User;

use crate::config::SecurityConfig;
use crate::entities::{activities, audit_log, employees, raffle_history, users};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn employee_repo(&self) -> repositories::employee::EmployeeRepository {
        repositories::employee::EmployeeRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn raffle_repo(&self) -> repositories::raffle::RaffleRepository {
        repositories::raffle::RaffleRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn record_login_failure(
        &self,
        user_id: i32,
        max_attempts: i32,
        lockout_seconds: i64,
    ) -> Result<bool> {
        self.user_repo()
            .record_failure(user_id, max_attempts, lockout_seconds)
            .await
    }

    pub async fn clear_login_failures(&self, user_id: i32) -> Result<()> {
        self.user_repo().clear_failures(user_id).await
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: &str,
        display_name: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(email, password, role, display_name, config)
            .await
    }

    pub async fn set_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .set_password(user_id, new_password, config)
            .await
    }

    pub async fn deactivate_user(&self, user_id: i32) -> Result<bool> {
        self.user_repo().deactivate(user_id).await
    }

    // ========== Employee / Ledger Repository Methods ==========

    pub async fn get_employee(&self, id: i32) -> Result<Option<employees::Model>> {
        self.employee_repo().get(id).await
    }

    pub async fn get_active_employee(&self, id: i32) -> Result<Option<employees::Model>> {
        self.employee_repo().get_active(id).await
    }

    pub async fn add_employee(&self, new: &NewEmployee) -> Result<Option<i32>> {
        self.employee_repo().add(new).await
    }

    pub async fn award_entries(
        &self,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        count: i32,
        awarded_by: i32,
        notes: Option<&str>,
    ) -> Result<Option<i32>> {
        self.employee_repo()
            .award(
                employee_id,
                activity_name,
                activity_category,
                count,
                awarded_by,
                notes,
            )
            .await
    }

    pub async fn reset_employee(&self, employee_id: i32, actor: i32) -> Result<Option<i32>> {
        self.employee_repo().reset(employee_id, actor).await
    }

    pub async fn soft_delete_employee(
        &self,
        employee_id: i32,
    ) -> Result<Option<employees::Model>> {
        self.employee_repo().soft_delete(employee_id).await
    }

    pub async fn reset_all_employees(&self, actor: i32) -> Result<ResetAllSummary> {
        self.employee_repo().reset_all(actor).await
    }

    pub async fn eligible_employees(&self) -> Result<Vec<employees::Model>> {
        self.employee_repo().eligible().await
    }

    pub async fn list_active_employees(
        &self,
        recent_activities: u64,
    ) -> Result<Vec<(employees::Model, Vec<activities::Model>)>> {
        self.employee_repo().list_active(recent_activities).await
    }

    pub async fn activities_for_employee(
        &self,
        employee_id: i32,
    ) -> Result<Vec<activities::Model>> {
        self.employee_repo().activities_for(employee_id).await
    }

    pub async fn analytics(&self) -> Result<AnalyticsSummary> {
        self.employee_repo().analytics().await
    }

    // ========== Raffle Repository Methods ==========

    #[allow(clippy::too_many_arguments)]
    pub async fn record_raffle_winner(
        &self,
        winner_id: i32,
        prize: &str,
        total_participants: i32,
        total_entries_at_draw: i32,
        winning_chance: f64,
        conducted_by: i32,
    ) -> Result<Option<(i32, String)>> {
        self.raffle_repo()
            .record(
                winner_id,
                prize,
                total_participants,
                total_entries_at_draw,
                winning_chance,
                conducted_by,
            )
            .await
    }

    pub async fn raffle_history(&self) -> Result<Vec<raffle_history::Model>> {
        self.raffle_repo().history().await
    }

    // ========== Audit Log Methods ==========

    pub async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        self.audit_repo().append(entry).await
    }

    pub async fn list_audit(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<audit_log::Model>, u64)> {
        self.audit_repo().list(page, page_size, action_filter).await
    }
}
