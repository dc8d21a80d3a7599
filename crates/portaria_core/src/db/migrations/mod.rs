//! Embedded schema steps for the local store.
//!
//! # Invariants
//! - Step versions are strictly increasing; `PRAGMA user_version` records
//!   the last applied step.
//! - Pending steps run in one transaction: all apply or none do.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

/// `(user_version after the step, script)`.
const STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_kv_entries.sql")),
    (2, include_str!("0002_seed_collections.sql")),
];

/// Schema versions before and after one `apply_migrations` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
}

impl MigrationReport {
    pub fn applied_any(&self) -> bool {
        self.to_version > self.from_version
    }
}

/// Returns the latest schema version this binary can write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings the connection's schema up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let report = MigrationReport {
        from_version,
        to_version: latest,
    };
    if !report.applied_any() {
        return Ok(report);
    }

    let tx = conn.transaction()?;
    for (version, script) in STEPS.iter().filter(|(version, _)| *version > from_version) {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_migrate_step module=db status=ok version={version}");
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        report.from_version, report.to_version
    );
    Ok(report)
}
