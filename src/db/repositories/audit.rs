use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{audit_log, prelude::*};

/// One sensitive action to record. All fields except the description are
/// optional so pre-login failures and system-level events fit too.
#[derive(Debug, Clone, Default)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}

impl AuditEntry {
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn actor(mut self, user_id: i32) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn table(mut self, table_name: impl Into<String>, record_id: i64) -> Self {
        self.table_name = Some(table_name.into());
        self.record_id = Some(record_id);
        self
    }

    #[must_use]
    pub fn old_values(mut self, values: serde_json::Value) -> Self {
        self.old_values = Some(values);
        self
    }

    #[must_use]
    pub fn new_values(mut self, values: serde_json::Value) -> Self {
        self.new_values = Some(values);
        self
    }

    #[must_use]
    pub fn ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append one record. There is no update or delete counterpart.
    pub async fn append(&self, entry: AuditEntry) -> Result<()> {
        let active = audit_log::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            table_name: Set(entry.table_name),
            record_id: Set(entry.record_id),
            old_values: Set(entry.old_values.map(|v| v.to_string())),
            new_values: Set(entry.new_values.map(|v| v.to_string())),
            ip_address: Set(entry.ip_address),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        AuditLog::insert(active)
            .exec(&self.conn)
            .await
            .context("Failed to append audit log entry")?;

        Ok(())
    }

    /// Page through the trail, newest first, for compliance export. Pages
    /// are zero-based.
    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        action_filter: Option<String>,
    ) -> Result<(Vec<audit_log::Model>, u64)> {
        let mut query = AuditLog::find().order_by_desc(audit_log::Column::CreatedAt);

        if let Some(action) = action_filter {
            query = query.filter(audit_log::Column::Action.contains(action));
        }

        let paginator = query.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let items = paginator.fetch_page(page).await?;

        Ok((items, total_pages))
    }

    pub async fn count(&self) -> Result<u64> {
        let count = AuditLog::find()
            .count(&self.conn)
            .await
            .context("Failed to count audit log entries")?;

        Ok(count)
    }
}
