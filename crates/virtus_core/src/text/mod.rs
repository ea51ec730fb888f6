//! Text folding helpers shared by repositories and services.
//!
//! # Responsibility
//! - Provide the accent-insensitive comparison form used by search.
//! - Derive URL-safe slugs from display names.

pub mod normalize;
