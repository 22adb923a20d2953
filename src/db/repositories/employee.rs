use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
    TransactionTrait,
};
use serde::Serialize;

use super::retry_on_busy;
use crate::entities::{activities, employees, prelude::*};

/// Metadata accepted when registering an employee. Everything except the
/// name is optional.
#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResetAllSummary {
    pub employees_reset: u64,
    pub entries_cleared: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub employee_name: String,
    pub activity_name: String,
    pub entries_awarded: i32,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPerformer {
    pub name: String,
    pub total_entries: i32,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentStat {
    pub department: String,
    pub employee_count: i64,
    pub total_entries: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_employees: i64,
    pub total_entries: i64,
    pub recent_activities: Vec<RecentActivity>,
    pub top_performers: Vec<TopPerformer>,
    pub department_stats: Vec<DepartmentStat>,
}

pub struct EmployeeRepository {
    conn: DatabaseConnection,
}

impl EmployeeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<employees::Model>> {
        let employee = Employees::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query employee")?;

        Ok(employee)
    }

    pub async fn get_active(&self, id: i32) -> Result<Option<employees::Model>> {
        let employee = Employees::find_by_id(id)
            .filter(employees::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query active employee")?;

        Ok(employee)
    }

    /// Insert a new employee. Returns `None` when the name (case-sensitive)
    /// or a non-empty email (case-insensitive) is already taken.
    pub async fn add(&self, new: &NewEmployee) -> Result<Option<i32>> {
        retry_on_busy(|| self.try_add(new)).await
    }

    async fn try_add(&self, new: &NewEmployee) -> Result<Option<i32>> {
        let email = new
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());

        let txn = self.conn.begin().await?;

        let mut conflict = Employees::find().filter(employees::Column::Name.eq(&new.name));
        if let Some(ref email) = email {
            conflict = Employees::find().filter(
                employees::Column::Name
                    .eq(&new.name)
                    .or(employees::Column::Email.eq(email)),
            );
        }

        if conflict.one(&txn).await?.is_some() {
            txn.rollback().await?;
            return Ok(None);
        }

        let now = Utc::now().to_rfc3339();
        let active = employees::ActiveModel {
            name: Set(new.name.clone()),
            email: Set(email),
            phone: Set(new.phone.clone()),
            department: Set(new.department.clone()),
            position: Set(new.position.clone()),
            total_entries: Set(0),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        // A concurrent insert can slip past the conflict check above; the
        // unique constraint is the backstop, and it still means "taken".
        let model = match active.insert(&txn).await {
            Ok(model) => model,
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                txn.rollback().await?;
                return Ok(None);
            }
            Err(err) => return Err(err).context("Failed to insert employee"),
        };
        txn.commit().await?;

        Ok(Some(model.id))
    }

    /// Award entries to an active employee: one activity row plus the total
    /// increment, committed atomically so the sum invariant holds at every
    /// observable point. The increment is expressed in SQL rather than
    /// read-modify-write in Rust, so concurrent awards cannot lose updates.
    ///
    /// Returns the new total, or `None` when the employee is absent or
    /// soft-deleted.
    pub async fn award(
        &self,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        count: i32,
        awarded_by: i32,
        notes: Option<&str>,
    ) -> Result<Option<i32>> {
        retry_on_busy(|| {
            self.try_award(
                employee_id,
                activity_name,
                activity_category,
                count,
                awarded_by,
                notes,
            )
        })
        .await
    }

    async fn try_award(
        &self,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        count: i32,
        awarded_by: i32,
        notes: Option<&str>,
    ) -> Result<Option<i32>> {
        let txn = self.conn.begin().await?;

        let Some(_employee) = Employees::find_by_id(employee_id)
            .filter(employees::Column::IsActive.eq(true))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let now = Utc::now().to_rfc3339();
        Self::insert_activity(
            &txn,
            employee_id,
            activity_name,
            activity_category,
            count,
            awarded_by,
            notes,
            &now,
        )
        .await?;

        Employees::update_many()
            .col_expr(
                employees::Column::TotalEntries,
                Expr::col(employees::Column::TotalEntries).add(count),
            )
            .col_expr(employees::Column::UpdatedAt, Expr::value(now))
            .filter(employees::Column::Id.eq(employee_id))
            .exec(&txn)
            .await?;

        let new_total = Employees::find_by_id(employee_id)
            .one(&txn)
            .await?
            .map(|e| e.total_entries)
            .ok_or_else(|| anyhow::anyhow!("Employee vanished mid-transaction: {employee_id}"))?;

        txn.commit().await?;

        Ok(Some(new_total))
    }

    /// Zero an employee's total and insert the corrective activity row in
    /// one transaction, preserving the sum invariant without deleting
    /// history. Returns the total before the reset.
    pub async fn reset(&self, employee_id: i32, actor: i32) -> Result<Option<i32>> {
        retry_on_busy(|| self.try_reset(employee_id, actor)).await
    }

    async fn try_reset(&self, employee_id: i32, actor: i32) -> Result<Option<i32>> {
        let txn = self.conn.begin().await?;

        let Some(employee) = Employees::find_by_id(employee_id)
            .filter(employees::Column::IsActive.eq(true))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let old_total = employee.total_entries;
        let now = Utc::now().to_rfc3339();

        Self::insert_activity(
            &txn,
            employee_id,
            "Points Reset",
            "system",
            -old_total,
            actor,
            Some(&format!("Reset from {old_total} to 0")),
            &now,
        )
        .await?;

        let mut active: employees::ActiveModel = employee.into();
        active.total_entries = Set(0);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        txn.commit().await?;

        Ok(Some(old_total))
    }

    /// Soft delete: history and totals stay behind for the record, the
    /// employee just stops appearing in listings and raffles. Returns the
    /// record as it was before the flag changed.
    pub async fn soft_delete(&self, employee_id: i32) -> Result<Option<employees::Model>> {
        let Some(employee) = Employees::find_by_id(employee_id)
            .one(&self.conn)
            .await
            .context("Failed to query employee for deletion")?
        else {
            return Ok(None);
        };

        let snapshot = employee.clone();
        let mut active: employees::ActiveModel = employee.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(Some(snapshot))
    }

    /// Bulk reset: one corrective activity per employee still holding
    /// entries, all totals zeroed, everyone deactivated. Single transaction;
    /// either the whole sweep lands or none of it does.
    pub async fn reset_all(&self, actor: i32) -> Result<ResetAllSummary> {
        retry_on_busy(|| self.try_reset_all(actor)).await
    }

    async fn try_reset_all(&self, actor: i32) -> Result<ResetAllSummary> {
        let txn = self.conn.begin().await?;

        let holding = Employees::find()
            .filter(employees::Column::TotalEntries.gt(0))
            .all(&txn)
            .await?;

        let now = Utc::now().to_rfc3339();
        let mut entries_cleared: i64 = 0;

        for employee in &holding {
            entries_cleared += i64::from(employee.total_entries);
            Self::insert_activity(
                &txn,
                employee.id,
                "System Reset",
                "system",
                -employee.total_entries,
                actor,
                Some("All data reset"),
                &now,
            )
            .await?;
        }

        Employees::update_many()
            .col_expr(employees::Column::TotalEntries, Expr::value(0))
            .col_expr(employees::Column::IsActive, Expr::value(false))
            .col_expr(employees::Column::UpdatedAt, Expr::value(now))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(ResetAllSummary {
            employees_reset: holding.len() as u64,
            entries_cleared,
        })
    }

    /// Active employees holding at least one entry, ordered by name.
    pub async fn eligible(&self) -> Result<Vec<employees::Model>> {
        let employees = Employees::find()
            .filter(employees::Column::IsActive.eq(true))
            .filter(employees::Column::TotalEntries.gt(0))
            .order_by_asc(employees::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query eligible employees")?;

        Ok(employees)
    }

    /// Active employees with their most recent activity rows.
    pub async fn list_active(
        &self,
        recent_activities: u64,
    ) -> Result<Vec<(employees::Model, Vec<activities::Model>)>> {
        let employees = Employees::find()
            .filter(employees::Column::IsActive.eq(true))
            .order_by_asc(employees::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list employees")?;

        let mut result = Vec::with_capacity(employees.len());
        for employee in employees {
            let activities = Activities::find()
                .filter(activities::Column::EmployeeId.eq(employee.id))
                .order_by_desc(activities::Column::CreatedAt)
                .limit(recent_activities)
                .all(&self.conn)
                .await?;
            result.push((employee, activities));
        }

        Ok(result)
    }

    pub async fn activities_for(&self, employee_id: i32) -> Result<Vec<activities::Model>> {
        let rows = Activities::find()
            .filter(activities::Column::EmployeeId.eq(employee_id))
            .order_by_asc(activities::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query activities")?;

        Ok(rows)
    }

    pub async fn analytics(&self) -> Result<AnalyticsSummary> {
        let total_employees = Employees::find()
            .filter(employees::Column::IsActive.eq(true))
            .count(&self.conn)
            .await? as i64;

        let backend = self.conn.get_database_backend();

        let total_entries = self
            .conn
            .query_one(Statement::from_string(
                backend,
                "SELECT COALESCE(SUM(total_entries), 0) AS total FROM employees WHERE is_active = 1"
                    .to_string(),
            ))
            .await?
            .map_or(0, |row| row.try_get::<i64>("", "total").unwrap_or(0));

        let recent = Activities::find()
            .find_also_related(Employees)
            .filter(employees::Column::IsActive.eq(true))
            .order_by_desc(activities::Column::CreatedAt)
            .limit(10)
            .all(&self.conn)
            .await?;

        let recent_activities = recent
            .into_iter()
            .filter_map(|(activity, employee)| {
                employee.map(|e| RecentActivity {
                    employee_name: e.name,
                    activity_name: activity.activity_name,
                    entries_awarded: activity.entries_awarded,
                    created_at: activity.created_at,
                })
            })
            .collect();

        let top_performers = Employees::find()
            .filter(employees::Column::IsActive.eq(true))
            .filter(employees::Column::TotalEntries.gt(0))
            .order_by_desc(employees::Column::TotalEntries)
            .limit(10)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| TopPerformer {
                name: e.name,
                total_entries: e.total_entries,
                department: e.department,
            })
            .collect();

        let department_rows = self
            .conn
            .query_all(Statement::from_string(
                backend,
                "SELECT department, COUNT(*) AS employee_count, \
                 COALESCE(SUM(total_entries), 0) AS total_entries \
                 FROM employees WHERE is_active = 1 AND department IS NOT NULL \
                 GROUP BY department ORDER BY total_entries DESC"
                    .to_string(),
            ))
            .await?;

        let mut department_stats = Vec::with_capacity(department_rows.len());
        for row in department_rows {
            department_stats.push(DepartmentStat {
                department: row.try_get("", "department")?,
                employee_count: row.try_get("", "employee_count")?,
                total_entries: row.try_get("", "total_entries")?,
            });
        }

        Ok(AnalyticsSummary {
            total_employees,
            total_entries,
            recent_activities,
            top_performers,
            department_stats,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_activity(
        txn: &DatabaseTransaction,
        employee_id: i32,
        activity_name: &str,
        activity_category: &str,
        entries_awarded: i32,
        awarded_by: i32,
        notes: Option<&str>,
        now: &str,
    ) -> Result<()> {
        let active = activities::ActiveModel {
            employee_id: Set(employee_id),
            activity_name: Set(activity_name.to_string()),
            activity_category: Set(activity_category.to_string()),
            entries_awarded: Set(entries_awarded),
            awarded_by: Set(awarded_by),
            notes: Set(notes.map(ToString::to_string)),
            created_at: Set(now.to_string()),
            ..Default::default()
        };

        Activities::insert(active).exec(txn).await?;
        Ok(())
    }
}
