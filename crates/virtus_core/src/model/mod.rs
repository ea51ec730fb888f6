//! Domain records persisted by the store.
//!
//! # Responsibility
//! - Define the record shapes exchanged with repositories and services.
//! - Own the enumerated vocabularies and their translation tables.
//!
//! # Invariants
//! - Enumerated fields on records always carry codes, never stored labels.
//! - Every record is identified by a stable UUID.

pub mod client;
pub mod exercise;
pub mod invoice;
pub mod session;
pub mod vocabulary;
