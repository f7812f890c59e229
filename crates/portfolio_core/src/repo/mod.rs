//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the CRUD contract over the contact collection.
//! - Isolate blob (de)serialization from service/form orchestration.
//!
//! # Invariants
//! - Write paths only ever store validated `Contacto` values.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateEmail`,
//!   `InsufficientStorage`) in addition to store transport errors.

pub mod contacto_repo;
