//! Training session records.
//!
//! # Invariants
//! - A session outlives its client: deleting the client clears `client_id`.
//! - Session exercises are ordered by `position` and vanish with the session.

use crate::model::client::ClientId;
use crate::model::exercise::ExerciseId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub client_id: Option<ClientId>,
    pub session_date: NaiveDate,
    pub title: Option<String>,
    pub created_at: i64,
}

impl Session {
    pub fn new(client_id: Option<ClientId>, session_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            session_date,
            title: None,
            created_at: 0,
        }
    }
}

/// One exercise slot inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionExercise {
    pub session_id: SessionId,
    pub exercise_id: ExerciseId,
    pub position: u32,
}
