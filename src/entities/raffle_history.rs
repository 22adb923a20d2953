use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Write-once raffle results. Recording a winner does not consume entries.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "raffle_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub winner_id: i32,

    pub prize: String,

    pub total_participants: i32,

    pub total_entries_at_draw: i32,

    pub winning_chance: f64,

    pub conducted_by: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employees::Entity",
        from = "Column::WinnerId",
        to = "super::employees::Column::Id"
    )]
    Winner,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Winner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
