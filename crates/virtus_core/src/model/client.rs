//! Client record.
//!
//! # Invariants
//! - `(first_name, last_name, birthdate)` identifies at most one client.
//! - Anonymized clients keep physical data but lose every contact field.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ClientId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<String>,
    pub birthdate: NaiveDate,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub objective: Option<String>,
    pub injuries: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Unix epoch seconds, stamped by the repository on insert.
    pub created_at: i64,
}

impl Client {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthdate: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            sex: None,
            birthdate,
            height_cm: None,
            weight_kg: None,
            objective: None,
            injuries: None,
            email: None,
            phone: None,
            created_at: 0,
        }
    }

    /// Clears name and contact fields before the row is removed.
    pub fn anonymize(&mut self) {
        self.first_name = None;
        self.last_name = None;
        self.email = None;
        self.phone = None;
    }
}
