//! SQLite-backed key-value storage
//!
//! This module handles:
//! - Database initialization and migrations
//! - Get/set/remove of string values by key

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::store::{KeyValueStore, StoreError};

/// Migrations compiled into the binary, applied in order
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../db/migrations/001_initial_schema.sql"),
)];

/// Initialize the database at the given path, running any pending migrations
pub fn init_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let count = run_migrations(&conn)?;
    if count > 0 {
        info!(count = count, path = %db_path.display(), "Applied migrations");
    }

    Ok(conn)
}

/// Run pending migrations
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    let mut applied = 0;

    for (version, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
            [version],
            |row| row.get(0),
        )?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("Failed to apply migration: {}", version))?;

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;

        debug!(version = %version, "Applied migration");
        applied += 1;
    }

    Ok(applied)
}

/// Get the value stored under a key
pub fn get_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()
}

/// Insert or replace the value stored under a key
pub fn set_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

/// Delete a key; returns whether it existed
pub fn remove_value(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let affected = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
    Ok(affected > 0)
}

/// Count stored keys
#[cfg(test)]
pub fn count_values(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// [`KeyValueStore`] over a single SQLite connection
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            conn: init_db(db_path)?,
        })
    }

    /// Fresh database that lives only as long as the store
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(get_value(&self.conn, key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(set_value(&self.conn, key, value)?)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        remove_value(&self.conn, key)?;
        Ok(())
    }
}
