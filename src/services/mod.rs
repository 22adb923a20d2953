pub mod access;
pub mod auth_service;
pub mod auth_service_impl;
pub mod backup;
pub mod import;
pub mod ledger_service;
pub mod ledger_service_impl;
pub mod rate_limit;
pub mod token;

pub use access::{AccessError, Operation, Role, authorize};
pub use auth_service::{AuthError, AuthService, AuthenticatedUser};
pub use auth_service_impl::SeaOrmAuthService;
pub use backup::BackupCoordinator;
pub use import::{ImportReport, NameImporter};
pub use ledger_service::{
    Actor, LedgerError, LedgerService, RESET_ALL_CONFIRMATION, RaffleWeight, ResetAllReport,
    WinnerRecord,
};
pub use ledger_service_impl::SeaOrmLedgerService;
pub use rate_limit::{RateLimiter, RateScope};
pub use token::{Claims, TokenSigner};
