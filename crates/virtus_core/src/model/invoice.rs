//! Invoice record.
//!
//! # Invariants
//! - `number` is unique and formatted `YYYY-NNN` by the invoice service.
//! - `status` holds an `InvoiceStatus` code (`PAID` / `UNPAID`).

use crate::model::client::ClientId;
use crate::model::vocabulary::InvoiceStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type InvoiceId = Uuid;

pub const DEFAULT_TEMPLATE: &str = "classic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub client_id: Option<ClientId>,
    pub number: String,
    pub label: Option<String>,
    pub amount_cents: i64,
    pub status: String,
    pub issued_on: NaiveDate,
    pub paid_on: Option<NaiveDate>,
    pub pdf_path: Option<String>,
    /// Name of the document template used by the export collaborator.
    pub template: String,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid.code()
    }
}
