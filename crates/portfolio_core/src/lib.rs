//! Core contact-form logic for the portfolio site.
//! This crate is the single source of truth for contact-record invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, PortfolioConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contacto::{
    Contacto, ContactoDraft, ContactoField, ContactoId, ContactoPatch, FieldError,
    PreferenciaContacto, ValidationErrors,
};
pub use model::form::FormData;
pub use repo::contacto_repo::{
    ContactoRepository, ImportSummary, KvContactoRepository, RepoError, RepoResult, StorageUsage,
};
pub use service::contacto_service::{
    ContactoService, ContactoView, DeleteOutcome, Notification, NotificationLevel, ServiceError,
    StorageReport,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
