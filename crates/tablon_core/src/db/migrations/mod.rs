//! Board schema upgrades.
//!
//! The `kv_store` layout is versioned through `PRAGMA user_version`; each
//! numbered SQL script here moves a database one step forward.
//!
//! # Invariants
//! - Script numbers only grow; a gap or reorder is a build bug.
//! - A database never ends up half-upgraded: every pending script and the
//!   version bump commit together.
//! - A file stamped by a newer build is refused, not downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_kv_store.sql"),
}];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the file is ahead of this build.
/// - SQLite failures while running a script; nothing is committed then.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    let pending = pending_after(current);
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={current} to={latest}");
    Ok(())
}

/// Schema version stamped on the open file (`0` for a fresh one).
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn pending_after(version: u32) -> &'static [Migration] {
    let start = MIGRATIONS.partition_point(|migration| migration.version <= version);
    &MIGRATIONS[start..]
}

#[cfg(test)]
mod tests {
    use super::{latest_version, pending_after, MIGRATIONS};

    #[test]
    fn script_numbers_strictly_grow() {
        assert!(MIGRATIONS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
        assert_eq!(latest_version(), 1);
    }

    #[test]
    fn pending_scripts_start_after_stamped_version() {
        assert_eq!(pending_after(0).len(), MIGRATIONS.len());
        assert!(pending_after(latest_version()).is_empty());
        assert!(pending_after(latest_version() + 5).is_empty());
    }
}
