use sea_orm::entity::prelude::*;

/// Append-only ledger rows. One row per award, reset correction, or legacy
/// import; never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub employee_id: i32,

    pub activity_name: String,

    pub activity_category: String,

    /// Positive for awards, negative for resets/corrections.
    pub entries_awarded: i32,

    /// User id of the actor.
    pub awarded_by: i32,

    pub notes: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::EmployeeId",
        to = "super::employees::Column::Id"
    )]
    Employee,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
