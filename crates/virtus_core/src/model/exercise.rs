//! Exercise catalogue record.
//!
//! # Invariants
//! - `primary_muscle`, `secondary_muscles`, `equipment` and `pattern` hold
//!   vocabulary codes (`"PECTORAUX"`), or the raw stored value when it is not
//!   part of the vocabulary.
//! - A new exercise starts active.

use crate::text::normalize::slugify;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ExerciseId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub slug: String,
    pub primary_muscle: String,
    pub secondary_muscles: Vec<String>,
    pub equipment: Option<String>,
    pub pattern: Option<String>,
    /// 1 (easy) to 5 (hard) by convention.
    pub difficulty: Option<i64>,
    pub tempo: Option<String>,
    pub rep_range: Option<String>,
    pub rpe_default: Option<f64>,
    pub rest_s_default: Option<i64>,
    /// Free-text coaching cues, searched together with `name`.
    pub cues: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    /// Unix epoch seconds, stamped by the repository.
    pub created_at: i64,
    pub updated_at: i64,
}

impl Exercise {
    /// Creates an active exercise with a generated id and no optional fields.
    ///
    /// The slug is derived from `name`.
    pub fn new(name: impl Into<String>, primary_muscle: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            primary_muscle: primary_muscle.into(),
            secondary_muscles: Vec::new(),
            equipment: None,
            pattern: None,
            difficulty: None,
            tempo: None,
            rep_range: None,
            rpe_default: None,
            rest_s_default: None,
            cues: None,
            image_path: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}
