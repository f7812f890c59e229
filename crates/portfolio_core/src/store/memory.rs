//! In-memory key-value store.
//!
//! Substitutes the durable store in tests and ephemeral sessions. Values live
//! only as long as the store instance.

use super::{ensure_within_quota, entry_bytes, KeyValueStore, StoreResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store rejecting writes beyond `quota_bytes` total usage.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.borrow_mut();
        let used_by_others = entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, stored)| entry_bytes(existing, stored))
            .sum();
        ensure_within_quota(self.quota_bytes, used_by_others, key, value)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn used_bytes(&self) -> StoreResult<u64> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .map(|(key, value)| entry_bytes(key, value))
            .sum())
    }

    fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::store::{KeyValueStore, StoreError};

    #[test]
    fn set_get_remove_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("k").unwrap(), None);

        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.used_bytes().unwrap(), 3);

        store.remove_item("k").unwrap();
        store.remove_item("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn quota_rejection_keeps_previous_value() {
        let store = MemoryStore::with_quota(10);
        store.set_item("key", "small").unwrap();

        let err = store.set_item("key", "much too large").unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuotaExceeded {
                requested_bytes: 17,
                quota_bytes: 10
            }
        ));
        assert_eq!(store.get_item("key").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn replacing_an_entry_does_not_count_it_twice() {
        let store = MemoryStore::with_quota(8);
        store.set_item("k", "1234567").unwrap();
        store.set_item("k", "7654321").unwrap();
        assert_eq!(store.used_bytes().unwrap(), 8);
    }
}
