//! Database snapshots and one-shot migration of the legacy JSON data file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ConnectionTrait, Statement};
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::{NewEmployee, Store};

pub struct BackupCoordinator {
    store: Store,
    backup_dir: PathBuf,
}

impl BackupCoordinator {
    #[must_use]
    pub fn new(store: Store, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            backup_dir: backup_dir.into(),
        }
    }

    /// Writes a consistent point-in-time copy of the database into the
    /// backup directory and returns its path.
    ///
    /// Uses SQLite's `VACUUM INTO`, which snapshots through the live
    /// connection without blocking concurrent readers.
    pub async fn snapshot(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.backup_dir)
            .await
            .with_context(|| format!("Failed to create backup dir {}", self.backup_dir.display()))?;

        let filename = format!("raffle_backup_{}.db", Utc::now().format("%Y%m%d_%H%M%S"));
        let target = self.backup_dir.join(filename);

        // VACUUM INTO takes a string literal, not a bind parameter.
        let escaped = target.display().to_string().replace('\'', "''");
        let backend = self.store.conn.get_database_backend();
        self.store
            .conn
            .execute(Statement::from_string(
                backend,
                format!("VACUUM INTO '{escaped}'"),
            ))
            .await
            .context("Backup snapshot failed")?;

        info!("Backup written to {}", target.display());

        Ok(target)
    }
}

#[derive(Debug, Deserialize)]
struct LegacyEmployee {
    #[serde(default)]
    points: i64,
    #[serde(default)]
    department: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyFile {
    Nested {
        employees: HashMap<String, LegacyEmployee>,
    },
    Flat(HashMap<String, i64>),
}

/// Imports the legacy flat-file data set, if one is present.
///
/// Each legacy employee is registered and granted their prior balance via a
/// single catch-up activity row, so the sum invariant holds from the first
/// migrated record. The source file is renamed with a `.migrated` suffix
/// afterwards so restarts do not import twice. A missing file is a no-op.
pub async fn migrate_legacy(store: &Store, path: &Path) -> Result<()> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let parsed: LegacyFile = serde_json::from_str(&raw)
        .with_context(|| format!("Legacy data file {} is not valid JSON", path.display()))?;

    let employees: Vec<(String, i64, Option<String>)> = match parsed {
        LegacyFile::Nested { employees } => employees
            .into_iter()
            .map(|(name, e)| (name, e.points, e.department))
            .collect(),
        LegacyFile::Flat(map) => map.into_iter().map(|(name, points)| (name, points, None)).collect(),
    };

    let mut imported = 0u32;
    let mut skipped = 0u32;

    for (name, points, department) in employees {
        let name = name.trim().to_string();
        if name.is_empty() {
            skipped += 1;
            continue;
        }

        let new = NewEmployee {
            name: name.clone(),
            department,
            ..Default::default()
        };

        let Some(employee_id) = store.add_employee(&new).await? else {
            skipped += 1;
            continue;
        };

        let points = i32::try_from(points.max(0)).unwrap_or(i32::MAX);
        if points > 0 {
            // Seeded admin (id 1) is the attributed actor for migrations.
            store
                .award_entries(
                    employee_id,
                    "Legacy import",
                    "system",
                    points,
                    1,
                    Some("Migrated from legacy data file"),
                )
                .await?;
        }

        imported += 1;
    }

    let migrated = path.with_extension("json.migrated");
    if let Err(e) = tokio::fs::rename(path, &migrated).await {
        warn!(
            "Legacy data imported but could not rename {}: {e}",
            path.display()
        );
    }

    info!("Legacy migration complete: {imported} imported, {skipped} skipped");

    Ok(())
}
