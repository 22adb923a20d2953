//! Bulk name import with junk filtering.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::db::{AuditEntry, NewEmployee, Store};
use crate::services::ledger_service::{Actor, LedgerError};
use crate::services::rate_limit::{RateLimiter, RateScope};

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub added: u32,
    pub skipped: u32,
}

pub struct NameImporter {
    store: Store,
    limiter: Arc<RateLimiter>,
}

impl NameImporter {
    #[must_use]
    pub const fn new(store: Store, limiter: Arc<RateLimiter>) -> Self {
        Self { store, limiter }
    }

    /// Registers a batch of employee names with zero entries each.
    ///
    /// Names that are too short, too long, letter-free, or placeholder
    /// values are skipped rather than failing the batch; duplicates count
    /// as skipped too. One audit entry summarizes the whole batch.
    pub async fn import_names(
        &self,
        names: &[String],
        actor: &Actor,
    ) -> Result<ImportReport, LedgerError> {
        if !self
            .limiter
            .try_acquire(RateScope::Import, &actor.source_address)
        {
            return Err(LedgerError::RateLimited);
        }

        if names.is_empty() {
            return Err(LedgerError::Validation("No names provided".to_string()));
        }

        let mut added = 0u32;
        let mut skipped = 0u32;

        for raw in names {
            let name = raw.trim();
            if !Self::acceptable(name) {
                skipped += 1;
                continue;
            }

            let new = NewEmployee {
                name: name.to_string(),
                ..Default::default()
            };

            match self.store.add_employee(&new).await? {
                Some(_) => added += 1,
                None => skipped += 1,
            }
        }

        let entry = AuditEntry::new(format!("Imported {added} employee names"))
            .actor(actor.user_id)
            .new_values(json!({ "added": added, "skipped": skipped }))
            .ip(&actor.source_address);
        if let Err(e) = self.store.append_audit(entry).await {
            error!("Failed to write audit log entry: {e:#}");
        }

        Ok(ImportReport { added, skipped })
    }

    fn acceptable(name: &str) -> bool {
        if !(3..50).contains(&name.chars().count()) {
            return false;
        }
        if !name.chars().any(char::is_alphabetic) {
            return false;
        }
        !matches!(name.to_lowercase().as_str(), "none" | "null" | "nan")
    }
}

#[cfg(test)]
mod tests {
    use super::NameImporter;

    #[test]
    fn test_name_filter() {
        assert!(NameImporter::acceptable("Ada Lovelace"));
        assert!(NameImporter::acceptable("Bo3"));
        assert!(!NameImporter::acceptable("Al"));
        assert!(!NameImporter::acceptable("123"));
        assert!(!NameImporter::acceptable("None"));
        assert!(!NameImporter::acceptable("null"));
        assert!(!NameImporter::acceptable("NaN"));
        assert!(NameImporter::acceptable(&"x".repeat(49)));
        assert!(!NameImporter::acceptable(&"x".repeat(50)));
    }
}
