//! Client repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Hard deletes rely on `ON DELETE SET NULL` to detach sessions and invoices.
//! - Anonymize-then-delete commits both writes or neither.
//! - Identity uniqueness is enforced by the schema and surfaced as `DuplicateKey`.

use crate::model::client::{Client, ClientId};
use crate::repo::{
    format_date, map_write_error, now_epoch_secs, parse_date, parse_uuid, RepoError, RepoResult,
};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, Row};

const ENTITY: &str = "client";

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    sex,
    birthdate,
    height_cm,
    weight_kg,
    objective,
    injuries,
    email,
    phone,
    created_at
FROM clients";

pub trait ClientRepository {
    fn create_client(&self, client: &Client) -> RepoResult<Client>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    fn get_client_by_identity(
        &self,
        first_name: &str,
        last_name: &str,
        birthdate: NaiveDate,
    ) -> RepoResult<Option<Client>>;
    fn list_clients(&self) -> RepoResult<Vec<Client>>;
    fn update_client(&self, client: &Client) -> RepoResult<()>;
    fn delete_client(&self, id: ClientId) -> RepoResult<()>;
    /// Overwrites names and contacts, then deletes the row, as one unit.
    fn anonymize_and_delete_client(&self, id: ClientId) -> RepoResult<()>;
}

pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn create_client(&self, client: &Client) -> RepoResult<Client> {
        let now = now_epoch_secs();
        self.conn
            .execute(
                "INSERT INTO clients (
                    id,
                    first_name,
                    last_name,
                    sex,
                    birthdate,
                    height_cm,
                    weight_kg,
                    objective,
                    injuries,
                    email,
                    phone,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                params![
                    client.id.to_string(),
                    client.first_name.as_deref(),
                    client.last_name.as_deref(),
                    client.sex.as_deref(),
                    format_date(client.birthdate),
                    client.height_cm,
                    client.weight_kg,
                    client.objective.as_deref(),
                    client.injuries.as_deref(),
                    client.email.as_deref(),
                    client.phone.as_deref(),
                    now,
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        let mut created = client.clone();
        created.created_at = now;
        Ok(created)
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }
        Ok(None)
    }

    fn get_client_by_identity(
        &self,
        first_name: &str,
        last_name: &str,
        birthdate: NaiveDate,
    ) -> RepoResult<Option<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE first_name = ?1
               AND last_name = ?2
               AND birthdate = ?3;"
        ))?;
        let mut rows = stmt.query(params![first_name, last_name, format_date(birthdate)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }
        Ok(None)
    }

    fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             ORDER BY last_name COLLATE NOCASE ASC, first_name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }
        Ok(clients)
    }

    fn update_client(&self, client: &Client) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE clients
                 SET
                    first_name = ?1,
                    last_name = ?2,
                    sex = ?3,
                    birthdate = ?4,
                    height_cm = ?5,
                    weight_kg = ?6,
                    objective = ?7,
                    injuries = ?8,
                    email = ?9,
                    phone = ?10
                 WHERE id = ?11;",
                params![
                    client.first_name.as_deref(),
                    client.last_name.as_deref(),
                    client.sex.as_deref(),
                    format_date(client.birthdate),
                    client.height_cm,
                    client.weight_kg,
                    client.objective.as_deref(),
                    client.injuries.as_deref(),
                    client.email.as_deref(),
                    client.phone.as_deref(),
                    client.id.to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, ENTITY))?;

        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, client.id));
        }
        Ok(())
    }

    fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(ENTITY, id));
        }
        info!("event=client_delete module=repo status=ok client_id={id}");
        Ok(())
    }

    fn anonymize_and_delete_client(&self, id: ClientId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut client = self
            .get_client(id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, id))?;
        client.anonymize();
        self.update_client(&client)?;
        self.delete_client(id)?;
        tx.commit()?;
        Ok(())
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let id_text: String = row.get("id")?;
    let birthdate_text: String = row.get("birthdate")?;

    Ok(Client {
        id: parse_uuid(&id_text, "clients.id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        sex: row.get("sex")?,
        birthdate: parse_date(&birthdate_text, "clients.birthdate")?,
        height_cm: row.get("height_cm")?,
        weight_kg: row.get("weight_kg")?,
        objective: row.get("objective")?,
        injuries: row.get("injuries")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}
