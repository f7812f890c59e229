//! Contact repository contracts and key-value blob implementation.
//!
//! # Responsibility
//! - Provide CRUD over the contact collection stored as one JSON array.
//! - Enforce insert-time email uniqueness.
//! - Export/import the collection in its persisted shape.
//!
//! # Invariants
//! - Every read deserializes the current blob; nothing is cached.
//! - Every write re-serializes and replaces the complete blob.
//! - A corrupt blob is reset to `[]` and logged; its contents are lost.
//! - Concurrent writers (other processes sharing the store) are not detected;
//!   the last full write wins.

use crate::config::{PortfolioConfig, DEFAULT_QUOTA_BYTES, DEFAULT_STORAGE_KEY};
use crate::model::contacto::{now_epoch_ms, Contacto, ContactoDraft, ContactoId, ValidationErrors};
use crate::store::{KeyValueStore, StoreError};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationErrors),
    NotFound(ContactoId),
    DuplicateEmail(String),
    DuplicateId(ContactoId),
    /// Store quota would be exceeded by the rewritten blob.
    InsufficientStorage {
        requested_bytes: u64,
        quota_bytes: u64,
    },
    /// Import payload is not a valid contact array.
    InvalidImport(String),
    Store(StoreError),
    Serialization(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "a contact with email `{email}` already exists"),
            Self::DuplicateId(id) => write!(f, "a contact with id `{id}` already exists"),
            Self::InsufficientStorage {
                requested_bytes,
                quota_bytes,
            } => write!(
                f,
                "insufficient storage: {requested_bytes} bytes needed, quota is {quota_bytes} bytes"
            ),
            Self::InvalidImport(message) => write!(f, "invalid contact import: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "failed to serialize contacts: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::QuotaExceeded {
                requested_bytes,
                quota_bytes,
            } => Self::InsufficientStorage {
                requested_bytes,
                quota_bytes,
            },
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Records whose id or email was already present.
    pub skipped_duplicates: usize,
}

/// Storage utilization snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub record_count: usize,
}

impl StorageUsage {
    /// Used share of the quota, `0.0` when the quota is zero.
    pub fn ratio(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.quota_bytes as f64
    }

    pub fn exceeds(&self, threshold: f64) -> bool {
        self.ratio() >= threshold
    }

    pub fn percent(&self) -> f64 {
        self.ratio() * 100.0
    }
}

/// Repository interface for contact CRUD operations.
pub trait ContactoRepository {
    fn get_all(&self) -> RepoResult<Vec<Contacto>>;
    fn get_by_id(&self, id: &ContactoId) -> RepoResult<Option<Contacto>>;
    /// Validates `draft`, rejects duplicate emails and appends the new record.
    fn add(&self, draft: &ContactoDraft) -> RepoResult<Contacto>;
    /// Replaces the revisable fields (asunto, mensaje, telefono, preferencia)
    /// of the stored record with the same id and refreshes its modification
    /// timestamp. Identity fields and `fechaCreacion` are never overwritten.
    fn update(&self, contacto: &Contacto) -> RepoResult<Contacto>;
    fn remove(&self, id: &ContactoId) -> RepoResult<()>;
    fn clear(&self) -> RepoResult<()>;
    fn export_json(&self) -> RepoResult<String>;
    fn import_json(&self, json: &str) -> RepoResult<ImportSummary>;
    fn storage_usage(&self) -> RepoResult<StorageUsage>;
}

/// Contact repository persisting one JSON blob in a key-value store.
pub struct KvContactoRepository<S: KeyValueStore> {
    store: S,
    key: String,
    assumed_quota_bytes: u64,
    clock: fn() -> i64,
}

impl<S: KeyValueStore> KvContactoRepository<S> {
    /// Creates a repository using the default storage key.
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: DEFAULT_STORAGE_KEY.to_string(),
            assumed_quota_bytes: DEFAULT_QUOTA_BYTES,
            clock: now_epoch_ms,
        }
    }

    pub fn from_config(store: S, config: &PortfolioConfig) -> Self {
        Self {
            key: config.storage_key.clone(),
            assumed_quota_bytes: config.quota_bytes,
            ..Self::new(store)
        }
    }

    /// Overrides the time source used for record timestamps.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self) -> RepoResult<Vec<Contacto>> {
        let Some(blob) = self.store.get_item(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Contacto>>(&blob) {
            Ok(items) => Ok(items),
            Err(err) => {
                // Metadata only: the serde message may quote stored personal data.
                warn!(
                    "event=contacts_load module=repo status=reset reason=corrupt_blob key={} category={:?} line={} column={}",
                    self.key,
                    err.classify(),
                    err.line(),
                    err.column()
                );
                self.persist(&[])?;
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, items: &[Contacto]) -> RepoResult<()> {
        let blob = serde_json::to_string(items)?;
        if let Err(err) = self.store.set_item(&self.key, &blob) {
            warn!(
                "event=contacts_persist module=repo status=error key={} bytes={} error={}",
                self.key,
                blob.len(),
                err
            );
            return Err(err.into());
        }
        Ok(())
    }
}

impl<S: KeyValueStore> ContactoRepository for KvContactoRepository<S> {
    fn get_all(&self) -> RepoResult<Vec<Contacto>> {
        self.load()
    }

    fn get_by_id(&self, id: &ContactoId) -> RepoResult<Option<Contacto>> {
        Ok(self.load()?.into_iter().find(|item| item.id() == id))
    }

    fn add(&self, draft: &ContactoDraft) -> RepoResult<Contacto> {
        let contacto = Contacto::parse(draft, (self.clock)())?;
        let mut items = self.load()?;

        if items.iter().any(|item| item.email() == contacto.email()) {
            return Err(RepoError::DuplicateEmail(contacto.email().to_string()));
        }
        if items.iter().any(|item| item.id() == contacto.id()) {
            return Err(RepoError::DuplicateId(contacto.id().clone()));
        }

        items.push(contacto.clone());
        self.persist(&items)?;
        info!(
            "event=contact_add module=repo status=ok id={} count={}",
            contacto.id(),
            items.len()
        );
        Ok(contacto)
    }

    fn update(&self, contacto: &Contacto) -> RepoResult<Contacto> {
        let mut items = self.load()?;
        let Some(index) = items.iter().position(|item| item.id() == contacto.id()) else {
            return Err(RepoError::NotFound(contacto.id().clone()));
        };
        let mut updated = items[index].clone();
        updated.adopt_revision(contacto);
        updated.validate()?;
        updated.touch((self.clock)());
        items[index] = updated.clone();
        self.persist(&items)?;

        info!(
            "event=contact_update module=repo status=ok id={}",
            updated.id()
        );
        Ok(updated)
    }

    fn remove(&self, id: &ContactoId) -> RepoResult<()> {
        let mut items = self.load()?;
        let Some(index) = items.iter().position(|item| item.id() == id) else {
            return Err(RepoError::NotFound(id.clone()));
        };

        items.remove(index);
        self.persist(&items)?;
        info!(
            "event=contact_remove module=repo status=ok id={} count={}",
            id,
            items.len()
        );
        Ok(())
    }

    fn clear(&self) -> RepoResult<()> {
        self.persist(&[])?;
        info!("event=contacts_clear module=repo status=ok");
        Ok(())
    }

    fn export_json(&self) -> RepoResult<String> {
        let items = self.load()?;
        Ok(serde_json::to_string_pretty(&items)?)
    }

    fn import_json(&self, json: &str) -> RepoResult<ImportSummary> {
        let incoming: Vec<Contacto> =
            serde_json::from_str(json).map_err(|err| RepoError::InvalidImport(err.to_string()))?;

        let mut items = self.load()?;
        let mut ids: BTreeSet<ContactoId> = items.iter().map(|item| item.id().clone()).collect();
        let mut emails: BTreeSet<String> =
            items.iter().map(|item| item.email().to_string()).collect();
        let mut summary = ImportSummary::default();

        for contacto in incoming {
            if ids.contains(contacto.id()) || emails.contains(contacto.email()) {
                summary.skipped_duplicates += 1;
                continue;
            }
            ids.insert(contacto.id().clone());
            emails.insert(contacto.email().to_string());
            items.push(contacto);
            summary.imported += 1;
        }

        if summary.imported > 0 {
            self.persist(&items)?;
        }
        info!(
            "event=contacts_import module=repo status=ok imported={} skipped={} count={}",
            summary.imported,
            summary.skipped_duplicates,
            items.len()
        );
        Ok(summary)
    }

    fn storage_usage(&self) -> RepoResult<StorageUsage> {
        let record_count = self.load()?.len();
        Ok(StorageUsage {
            used_bytes: self.store.used_bytes()?,
            quota_bytes: self
                .store
                .quota_bytes()
                .unwrap_or(self.assumed_quota_bytes),
            record_count,
        })
    }
}
