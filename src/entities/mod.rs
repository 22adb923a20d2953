pub mod prelude;

pub mod activities;
pub mod audit_log;
pub mod employees;
pub mod raffle_history;
pub mod users;
