//! Key-value persistence boundary.
//!
//! # Responsibility
//! - Abstract the string-keyed persistent store the repository writes its
//!   blob into, so durable and in-memory backends are interchangeable.
//! - Enforce an optional byte quota on writes.
//!
//! # Invariants
//! - A write rejected for quota reasons leaves the previous value untouched.
//! - Usage is the sum of UTF-8 byte lengths of every key and value.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store error.
#[derive(Debug)]
pub enum StoreError {
    /// Write would push total usage above the configured quota.
    QuotaExceeded {
        requested_bytes: u64,
        quota_bytes: u64,
    },
    /// Connection was handed over before migrations ran.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded {
                requested_bytes,
                quota_bytes,
            } => write!(
                f,
                "storage quota exceeded: {requested_bytes} bytes requested, quota is {quota_bytes} bytes"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed persistent store with local-storage semantics.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` when the key was never written.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    /// Replaces the whole value stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`; missing keys are not an error.
    fn remove_item(&self, key: &str) -> StoreResult<()>;
    /// Total bytes currently used by all entries.
    fn used_bytes(&self) -> StoreResult<u64>;
    /// Configured byte quota, if any.
    fn quota_bytes(&self) -> Option<u64>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }

    fn used_bytes(&self) -> StoreResult<u64> {
        (**self).used_bytes()
    }

    fn quota_bytes(&self) -> Option<u64> {
        (**self).quota_bytes()
    }
}

/// Byte footprint of one entry.
pub fn entry_bytes(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Rejects a write whose resulting usage would exceed `quota`.
///
/// `used_by_others` must exclude the entry being replaced.
pub(crate) fn ensure_within_quota(
    quota: Option<u64>,
    used_by_others: u64,
    key: &str,
    value: &str,
) -> StoreResult<()> {
    let Some(quota_bytes) = quota else {
        return Ok(());
    };
    let requested_bytes = used_by_others.saturating_add(entry_bytes(key, value));
    if requested_bytes > quota_bytes {
        return Err(StoreError::QuotaExceeded {
            requested_bytes,
            quota_bytes,
        });
    }
    Ok(())
}
