use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Append-only record of sensitive actions. There is deliberately no update
/// or delete API over this table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Actor, when known. Nullable so pre-login failures can be recorded.
    pub user_id: Option<i32>,

    pub action: String,

    pub table_name: Option<String>,

    pub record_id: Option<i64>,

    /// JSON snapshot before the change, when applicable.
    pub old_values: Option<String>,

    /// JSON snapshot after the change, when applicable.
    pub new_values: Option<String>,

    pub ip_address: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
