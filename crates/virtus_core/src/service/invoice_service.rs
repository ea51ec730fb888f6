//! Invoice use-case service.
//!
//! # Responsibility
//! - Allocate per-year sequential numbers (`2024-001`, `2024-002`, ...).
//! - Own the paid/unpaid transition.
//!
//! # Invariants
//! - A paid invoice keeps its original `paid_on`; marking it paid again is a no-op.
//! - Numbers are never reused by the service once issued for a year.

use crate::model::client::ClientId;
use crate::model::invoice::{Invoice, InvoiceId, DEFAULT_TEMPLATE};
use crate::model::vocabulary::InvoiceStatus;
use crate::repo::invoice_repo::InvoiceRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::{Datelike, Local, NaiveDate};
use log::info;
use uuid::Uuid;

const ENTITY: &str = "invoice";

/// Caller input for a new invoice. Number and status are assigned here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInvoice {
    pub client_id: Option<ClientId>,
    pub label: Option<String>,
    pub amount_cents: i64,
    /// Defaults to today in local time.
    pub issued_on: Option<NaiveDate>,
    /// Defaults to [`DEFAULT_TEMPLATE`].
    pub template: Option<String>,
}

pub struct InvoiceService<R: InvoiceRepository> {
    repo: R,
}

impl<R: InvoiceRepository> InvoiceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Issues an unpaid invoice numbered after the last one of its year.
    pub fn create_invoice(&self, request: &NewInvoice) -> RepoResult<Invoice> {
        let issued_on = request
            .issued_on
            .unwrap_or_else(|| Local::now().date_naive());
        let number = self.next_invoice_number(issued_on.year())?;

        let invoice = Invoice {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            number,
            label: request.label.clone(),
            amount_cents: request.amount_cents,
            status: InvoiceStatus::Unpaid.code().to_string(),
            issued_on,
            paid_on: None,
            pdf_path: None,
            template: request
                .template
                .clone()
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        };
        self.repo.create_invoice(&invoice)?;
        info!(
            "event=invoice_create module=service status=ok number={}",
            invoice.number
        );
        Ok(invoice)
    }

    /// Next `YYYY-NNN` number for `year`, starting at `001`.
    pub fn next_invoice_number(&self, year: i32) -> RepoResult<String> {
        let sequence = match self.repo.last_number_for_year(year)? {
            Some(last) => parse_sequence(&last)? + 1,
            None => 1,
        };
        Ok(format!("{year}-{sequence:03}"))
    }

    pub fn get_invoice(&self, id: InvoiceId) -> RepoResult<Option<Invoice>> {
        self.repo.get_invoice(id)
    }

    pub fn list_invoices(&self) -> RepoResult<Vec<Invoice>> {
        self.repo.list_invoices()
    }

    /// Marks an invoice paid on `paid_on` unless it already is.
    pub fn mark_paid(&self, id: InvoiceId, paid_on: NaiveDate) -> RepoResult<Invoice> {
        let mut invoice = self
            .repo
            .get_invoice(id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;
        if invoice.is_paid() {
            return Ok(invoice);
        }

        invoice.status = InvoiceStatus::Paid.code().to_string();
        invoice.paid_on = Some(paid_on);
        self.repo.update_invoice(&invoice)?;
        Ok(invoice)
    }

    /// Records where the exported document was written.
    pub fn attach_pdf(&self, id: InvoiceId, pdf_path: impl Into<String>) -> RepoResult<Invoice> {
        let mut invoice = self
            .repo
            .get_invoice(id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;
        invoice.pdf_path = Some(pdf_path.into());
        self.repo.update_invoice(&invoice)?;
        Ok(invoice)
    }

    pub fn delete_invoice(&self, id: InvoiceId) -> RepoResult<()> {
        self.repo.delete_invoice(id)
    }
}

fn parse_sequence(number: &str) -> RepoResult<u32> {
    number
        .split_once('-')
        .and_then(|(_, sequence)| sequence.parse::<u32>().ok())
        .ok_or_else(|| RepoError::InvalidData(format!("invalid invoice number `{number}`")))
}
