//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Persist key-value entries durably in the `kv_entries` table.
//! - Enforce the optional byte quota before each write.
//!
//! # Invariants
//! - The borrowed connection must come from `db::open_db*` (migrations applied).
//! - Each `set_item` replaces the full value in a single statement.

use super::{ensure_within_quota, KeyValueStore, StoreError, StoreResult};
use crate::db::migrations::{current_version, latest_version};
use rusqlite::{params, Connection, OptionalExtension};

const KV_TABLE: &str = "kv_entries";

/// Durable key-value store over a migrated SQLite connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    quota_bytes: Option<u64>,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable` when `kv_entries` does not exist.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version = current_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if table_exists != 1 {
            return Err(StoreError::MissingRequiredTable(KV_TABLE));
        }

        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }

    /// Sets the byte quota enforced on writes.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn sum_bytes(&self, excluding_key: Option<&str>) -> StoreResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(
                SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))),
                0
            )
            FROM kv_entries
            WHERE ?1 IS NULL OR key <> ?1;",
            params![excluding_key],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

impl KeyValueStore for SqliteStore<'_> {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let used_by_others = self.sum_bytes(Some(key))?;
        ensure_within_quota(self.quota_bytes, used_by_others, key, value)?;

        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn used_bytes(&self) -> StoreResult<u64> {
        self.sum_bytes(None)
    }

    fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }
}
