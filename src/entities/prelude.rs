pub use super::activities::Entity as Activities;
pub use super::audit_log::Entity as AuditLog;
pub use super::employees::Entity as Employees;
pub use super::raffle_history::Entity as RaffleHistory;
pub use super::users::Entity as Users;
