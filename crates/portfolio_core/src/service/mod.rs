//! Core use-case services.
//!
//! # Responsibility
//! - Mediate between form/UI events and the contact repository.
//! - Keep UI layers decoupled from storage details.

pub mod contacto_service;
