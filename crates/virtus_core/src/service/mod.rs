//! Catalogue, client and invoice use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply the pre-checks that give callers readable duplicate errors
//!   before the schema constraints fire.

pub mod client_service;
pub mod exercise_service;
pub mod invoice_service;
