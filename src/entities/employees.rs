use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    /// Stored lower-cased when present; uniqueness is enforced in the
    /// repository so that empty emails do not collide.
    pub email: Option<String>,

    pub phone: Option<String>,

    pub department: Option<String>,

    pub position: Option<String>,

    /// Stored aggregate; must always equal the sum of this employee's
    /// activity deltas.
    pub total_entries: i32,

    /// Soft-delete marker. Inactive employees keep their history but are
    /// excluded from listings and raffle eligibility.
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activities::Entity")]
    Activities,
}

impl Related<super::activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
