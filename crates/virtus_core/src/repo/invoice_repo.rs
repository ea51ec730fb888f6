//! Invoice repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `status` is stored as its label (`Payée`) and read back as its code.
//! - Invoice numbers are unique; collisions surface as `DuplicateKey`.

use crate::model::invoice::{Invoice, InvoiceId};
use crate::model::vocabulary::INVOICE_STATUSES;
use crate::repo::{
    format_date, map_write_error, parse_date, parse_optional_date, parse_optional_uuid,
    parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ENTITY: &str = "invoice";

const INVOICE_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    number,
    label,
    amount_cents,
    status,
    issued_on,
    paid_on,
    pdf_path,
    template
FROM invoices";

pub trait InvoiceRepository {
    fn create_invoice(&self, invoice: &Invoice) -> RepoResult<()>;
    fn get_invoice(&self, id: InvoiceId) -> RepoResult<Option<Invoice>>;
    fn list_invoices(&self) -> RepoResult<Vec<Invoice>>;
    fn update_invoice(&self, invoice: &Invoice) -> RepoResult<()>;
    fn delete_invoice(&self, id: InvoiceId) -> RepoResult<()>;
    /// Highest `YYYY-NNN` number issued for `year`, compared numerically.
    fn last_number_for_year(&self, year: i32) -> RepoResult<Option<String>>;
}

pub struct SqliteInvoiceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInvoiceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl InvoiceRepository for SqliteInvoiceRepository<'_> {
    fn create_invoice(&self, invoice: &Invoice) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO invoices (
                    id,
                    client_id,
                    number,
                    label,
                    amount_cents,
                    status,
                    issued_on,
                    paid_on,
                    pdf_path,
                    template
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    invoice.id.to_string(),
                    invoice.client_id.map(|id| id.to_string()),
                    invoice.number.as_str(),
                    invoice.label.as_deref(),
                    invoice.amount_cents,
                    INVOICE_STATUSES.label_for(&invoice.status),
                    format_date(invoice.issued_on),
                    invoice.paid_on.map(format_date),
                    invoice.pdf_path.as_deref(),
                    invoice.template.as_str(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;
        Ok(())
    }

    fn get_invoice(&self, id: InvoiceId) -> RepoResult<Option<Invoice>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INVOICE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_invoice_row(row)?));
        }
        Ok(None)
    }

    fn list_invoices(&self) -> RepoResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INVOICE_SELECT_SQL} ORDER BY issued_on DESC, number DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut invoices = Vec::new();
        while let Some(row) = rows.next()? {
            invoices.push(parse_invoice_row(row)?);
        }
        Ok(invoices)
    }

    fn update_invoice(&self, invoice: &Invoice) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE invoices
                 SET
                    client_id = ?1,
                    number = ?2,
                    label = ?3,
                    amount_cents = ?4,
                    status = ?5,
                    issued_on = ?6,
                    paid_on = ?7,
                    pdf_path = ?8,
                    template = ?9
                 WHERE id = ?10;",
                params![
                    invoice.client_id.map(|id| id.to_string()),
                    invoice.number.as_str(),
                    invoice.label.as_deref(),
                    invoice.amount_cents,
                    INVOICE_STATUSES.label_for(&invoice.status),
                    format_date(invoice.issued_on),
                    invoice.paid_on.map(format_date),
                    invoice.pdf_path.as_deref(),
                    invoice.template.as_str(),
                    invoice.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, invoice.id));
        }
        Ok(())
    }

    fn delete_invoice(&self, id: InvoiceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM invoices WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        Ok(())
    }

    fn last_number_for_year(&self, year: i32) -> RepoResult<Option<String>> {
        let number = self
            .conn
            .query_row(
                "SELECT number
                 FROM invoices
                 WHERE number LIKE ?1
                 ORDER BY CAST(substr(number, instr(number, '-') + 1) AS INTEGER) DESC
                 LIMIT 1;",
                [format!("{year}-%")],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(number)
    }
}

fn parse_invoice_row(row: &Row<'_>) -> RepoResult<Invoice> {
    let id_text: String = row.get("id")?;
    let status_label: String = row.get("status")?;
    let issued_text: String = row.get("issued_on")?;

    Ok(Invoice {
        id: parse_uuid(&id_text, "invoices.id")?,
        client_id: parse_optional_uuid(row.get("client_id")?, "invoices.client_id")?,
        number: row.get("number")?,
        label: row.get("label")?,
        amount_cents: row.get("amount_cents")?,
        status: INVOICE_STATUSES.code_for(&status_label).to_string(),
        issued_on: parse_date(&issued_text, "invoices.issued_on")?,
        paid_on: parse_optional_date(row.get("paid_on")?, "invoices.paid_on")?,
        pdf_path: row.get("pdf_path")?,
        template: row.get("template")?,
    })
}
