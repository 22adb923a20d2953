use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lower-cased; lookups lower-case the input first.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of "admin", "manager", "viewer".
    pub role: String,

    pub display_name: String,

    pub is_active: bool,

    /// Consecutive failed login attempts since the last success.
    pub failed_attempts: i32,

    /// RFC3339 timestamp; authentication is refused until it elapses.
    pub locked_until: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
