//! Role-based authorization as explicit per-operation allow-lists.
//!
//! There is deliberately no numeric role hierarchy: each operation names the
//! roles allowed to perform it, so adding a role later cannot silently widen
//! access to destructive operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Viewer,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "viewer" => Ok(Self::Viewer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListEmployees,
    ViewAnalytics,
    ViewRaffleWeights,
    ViewRaffleHistory,
    ChangeOwnPassword,
    AddEmployee,
    AwardEntries,
    ImportNames,
    RecordWinner,
    ResetEmployee,
    DeleteEmployee,
    ResetAll,
    CreateBackup,
    ExportAudit,
    ManageUsers,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient privileges")]
    Forbidden,
}

const ALL: &[Role] = &[Role::Admin, Role::Manager, Role::Viewer];
const MANAGER_UP: &[Role] = &[Role::Admin, Role::Manager];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// The allow-list table. Destructive operations require exactly `admin`
/// even though managers are otherwise broader than viewers.
#[must_use]
pub const fn allowed_roles(op: Operation) -> &'static [Role] {
    match op {
        Operation::ListEmployees
        | Operation::ViewAnalytics
        | Operation::ViewRaffleWeights
        | Operation::ViewRaffleHistory
        | Operation::ChangeOwnPassword => ALL,

        Operation::AddEmployee
        | Operation::AwardEntries
        | Operation::ImportNames
        | Operation::RecordWinner => MANAGER_UP,

        Operation::ResetEmployee
        | Operation::DeleteEmployee
        | Operation::ResetAll
        | Operation::CreateBackup
        | Operation::ExportAudit
        | Operation::ManageUsers => ADMIN_ONLY,
    }
}

pub fn authorize(role: Role, op: Operation) -> Result<(), AccessError> {
    if allowed_roles(op).contains(&role) {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_can_read() {
        assert!(authorize(Role::Viewer, Operation::ListEmployees).is_ok());
        assert!(authorize(Role::Viewer, Operation::ViewAnalytics).is_ok());
        assert!(authorize(Role::Viewer, Operation::ViewRaffleWeights).is_ok());
    }

    #[test]
    fn test_viewer_cannot_mutate() {
        assert_eq!(
            authorize(Role::Viewer, Operation::AwardEntries),
            Err(AccessError::Forbidden)
        );
        assert_eq!(
            authorize(Role::Viewer, Operation::AddEmployee),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn test_destructive_operations_are_admin_only() {
        // Managers can award but must not be able to delete or bulk-reset.
        assert!(authorize(Role::Manager, Operation::AwardEntries).is_ok());
        for op in [
            Operation::ResetEmployee,
            Operation::DeleteEmployee,
            Operation::ResetAll,
            Operation::CreateBackup,
            Operation::ExportAudit,
            Operation::ManageUsers,
        ] {
            assert_eq!(authorize(Role::Manager, op), Err(AccessError::Forbidden));
            assert!(authorize(Role::Admin, op).is_ok());
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Viewer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
