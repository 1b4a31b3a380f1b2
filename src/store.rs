//! Storage seam for tickets and the chat-integration registry.
//!
//! Every read and write is scoped by organization; a lookup with the
//! wrong organization is indistinguishable from a miss. Updates use
//! optimistic versioning: a record is accepted only at the version it
//! was read at, so concurrent read-modify-write sequences can race but
//! never silently clobber each other's changes.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{IntegrationSettings, Ticket};
use crate::{Result, SupportError};

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a freshly created ticket.
    async fn insert(&self, ticket: Ticket) -> Result<Ticket>;

    /// Fetch a ticket, scoped to its organization.
    async fn fetch(&self, organization_id: Uuid, id: Uuid) -> Result<Ticket>;

    /// All tickets of an organization, most recently updated first.
    async fn list(&self, organization_id: Uuid) -> Result<Vec<Ticket>>;

    /// Replace a ticket at the version it was read at.
    ///
    /// Fails with [`SupportError::Conflict`] when the stored version has
    /// moved on, leaving the stored record untouched. On success the
    /// returned ticket carries the bumped version.
    async fn update(&self, ticket: Ticket) -> Result<Ticket>;

    /// Hard-delete a ticket, scoped to its organization.
    async fn remove(&self, organization_id: Uuid, id: Uuid) -> Result<()>;

    /// The organization's integration registry, empty if never written.
    async fn integrations(&self, organization_id: Uuid) -> Result<IntegrationSettings>;

    /// Replace the integration registry at the version it was read at.
    ///
    /// A version-0 record is the initial insert for its organization.
    async fn put_integrations(&self, settings: IntegrationSettings) -> Result<IntegrationSettings>;
}

/// In-memory [`TicketStore`].
///
/// Backs the test suite and embedded deployments. The maps are keyed by
/// organization first, so cross-organization access cannot happen by
/// construction.
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<HashMap<(Uuid, Uuid), Ticket>>,
    integrations: RwLock<HashMap<Uuid, IntegrationSettings>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket> {
        let mut tickets = self.tickets.write().await;
        tickets.insert((ticket.organization_id, ticket.id), ticket.clone());
        Ok(ticket)
    }

    async fn fetch(&self, organization_id: Uuid, id: Uuid) -> Result<Ticket> {
        let tickets = self.tickets.read().await;
        tickets
            .get(&(organization_id, id))
            .cloned()
            .ok_or(SupportError::TicketNotFound(id))
    }

    async fn list(&self, organization_id: Uuid) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut result: Vec<_> = tickets
            .values()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    async fn update(&self, mut ticket: Ticket) -> Result<Ticket> {
        let mut tickets = self.tickets.write().await;
        let key = (ticket.organization_id, ticket.id);
        let stored = tickets
            .get(&key)
            .ok_or(SupportError::TicketNotFound(ticket.id))?;
        if stored.version != ticket.version {
            return Err(SupportError::Conflict(ticket.id));
        }
        ticket.version += 1;
        tickets.insert(key, ticket.clone());
        Ok(ticket)
    }

    async fn remove(&self, organization_id: Uuid, id: Uuid) -> Result<()> {
        let mut tickets = self.tickets.write().await;
        tickets
            .remove(&(organization_id, id))
            .map(|_| ())
            .ok_or(SupportError::TicketNotFound(id))
    }

    async fn integrations(&self, organization_id: Uuid) -> Result<IntegrationSettings> {
        let integrations = self.integrations.read().await;
        Ok(integrations
            .get(&organization_id)
            .cloned()
            .unwrap_or_else(|| IntegrationSettings::empty(organization_id)))
    }

    async fn put_integrations(&self, mut settings: IntegrationSettings) -> Result<IntegrationSettings> {
        let mut integrations = self.integrations.write().await;
        let stored_version = integrations
            .get(&settings.organization_id)
            .map(|s| s.version)
            .unwrap_or(0);
        if stored_version != settings.version {
            return Err(SupportError::Conflict(settings.organization_id));
        }
        settings.version += 1;
        integrations.insert(settings.organization_id, settings.clone());
        Ok(settings)
    }
}
