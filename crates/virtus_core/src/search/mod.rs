//! Multi-criteria catalogue search.
//!
//! # Responsibility
//! - Compose optional predicates into one parameterized query.
//! - Match free text accent-insensitively with a caller-supplied normalizer.

pub mod exercise_search;
