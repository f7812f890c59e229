//! Domain model for contact-form submissions.
//!
//! # Responsibility
//! - Define the canonical contact record persisted by the repository.
//! - Convert raw form input into validated records (parse, don't validate).
//!
//! # Invariants
//! - A `Contacto` value can only be obtained through validating constructors
//!   or validating deserialization.
//! - Every validation failure is attributed to one form field.

pub mod contacto;
pub mod form;
