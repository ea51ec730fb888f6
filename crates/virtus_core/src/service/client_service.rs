//! Client use-case service.
//!
//! # Invariants
//! - Deletion overwrites names and contacts and removes the row in one
//!   transaction.
//! - Sessions and invoices survive client deletion with `client_id = NULL`.

use crate::model::client::{Client, ClientId};
use crate::repo::client_repo::ClientRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

const ENTITY: &str = "client";

pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a client after checking `(first_name, last_name, birthdate)`.
    pub fn create_client(&self, client: &Client) -> RepoResult<Client> {
        self.ensure_identity_available(client)?;
        self.repo.create_client(client)
    }

    pub fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        self.repo.get_client(id)
    }

    pub fn list_clients(&self) -> RepoResult<Vec<Client>> {
        self.repo.list_clients()
    }

    pub fn update_client(&self, client: &Client) -> RepoResult<()> {
        let existing = self
            .repo
            .get_client(client.id)?
            .ok_or_else(|| RepoError::not_found(ENTITY, client.id))?;

        let identity_changed = existing.first_name != client.first_name
            || existing.last_name != client.last_name
            || existing.birthdate != client.birthdate;
        if identity_changed {
            self.ensure_identity_available(client)?;
        }
        self.repo.update_client(client)
    }

    /// Anonymizes then hard-deletes a client.
    pub fn delete_client(&self, id: ClientId) -> RepoResult<()> {
        self.repo.anonymize_and_delete_client(id)?;
        info!("event=client_anonymize module=service status=ok client_id={id}");
        Ok(())
    }

    fn ensure_identity_available(&self, client: &Client) -> RepoResult<()> {
        let (Some(first_name), Some(last_name)) =
            (client.first_name.as_deref(), client.last_name.as_deref())
        else {
            return Ok(());
        };

        match self
            .repo
            .get_client_by_identity(first_name, last_name, client.birthdate)?
        {
            Some(found) if found.id != client.id => Err(RepoError::DuplicateKey {
                entity: ENTITY,
                detail: format!(
                    "a client named `{first_name} {last_name}` born {} already exists",
                    client.birthdate
                ),
            }),
            _ => Ok(()),
        }
    }
}
