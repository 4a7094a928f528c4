//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated schema");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Latest registry state; a single row
        CREATE TABLE snapshots (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            state BLOB NOT NULL,              -- CBOR-encoded registry state
            last_seq INTEGER NOT NULL,        -- seq of the last event folded in
            updated_at INTEGER NOT NULL       -- local timestamp (Unix ms)
        );

        -- Event journal
        CREATE TABLE events (
            seq INTEGER PRIMARY KEY,          -- 1-based, contiguous
            event_id BLOB NOT NULL UNIQUE,    -- 32 bytes, Blake3 of canonical bytes
            kind INTEGER NOT NULL,            -- EventKind as u16
            item_key INTEGER,                 -- null for deposits
            canonical_bytes BLOB NOT NULL,    -- canonical CBOR encoding
            recorded_at INTEGER NOT NULL      -- local timestamp (Unix ms)
        );

        CREATE INDEX idx_events_kind ON events(kind);
        CREATE INDEX idx_events_item ON events(item_key);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
