//! Operation layer: validation, scoped read-modify-write, audit.
//!
//! Every mutation of a ticket is a single logical transaction: fetch the
//! current record, apply the change, write it back at the version it was
//! read at, and retry a bounded number of times when another writer got
//! there first. Message appends therefore always land on the latest
//! message list.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditSink};
use crate::models::{
    ChatIntegration, ChatIntegrationInput, CreateTicketInput, IntegrationSettings, MessageSender,
    Ticket, TicketStatus, UpdateTicketInput,
};
use crate::stats::{self, TicketStatistics};
use crate::store::TicketStore;
use crate::{Result, SupportError};

/// Retry budget for optimistic-version collisions.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// The support ticketing core.
///
/// Holds the storage seam and the audit sink; all operations take the
/// organization scope explicitly and an optional acting user for the
/// audit record. Authorization is assumed to be enforced by the caller.
pub struct SupportService {
    store: Arc<dyn TicketStore>,
    audit: Arc<dyn AuditSink>,
}

impl SupportService {
    pub fn new(store: Arc<dyn TicketStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Create a ticket. New tickets are open, unread-free and empty of
    /// messages.
    pub async fn create_ticket(
        &self,
        actor: Option<Uuid>,
        input: CreateTicketInput,
    ) -> Result<Ticket> {
        input.validate()?;
        let ticket = self.store.insert(Ticket::new(input)).await?;
        tracing::debug!(ticket = %ticket.id, organization = %ticket.organization_id, "created support ticket");

        self.emit_audit(AuditEntry {
            action: "create_support_ticket".to_string(),
            actor,
            resource_type: "support_ticket".to_string(),
            resource_id: ticket.id.to_string(),
            details: json!({ "subject": ticket.subject }),
            organization_id: ticket.organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(ticket)
    }

    /// Fetch one ticket within the organization scope.
    pub async fn get_ticket(&self, id: Uuid, organization_id: Uuid) -> Result<Ticket> {
        self.store.fetch(organization_id, id).await
    }

    /// All tickets of the organization, most recently updated first.
    pub async fn list_tickets(&self, organization_id: Uuid) -> Result<Vec<Ticket>> {
        self.store.list(organization_id).await
    }

    /// Merge a field patch into a ticket.
    pub async fn update_ticket(
        &self,
        actor: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        patch: UpdateTicketInput,
    ) -> Result<Ticket> {
        patch.validate()?;
        let ticket = self
            .modify(organization_id, id, move |ticket| {
                ticket.apply_update(patch.clone())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "update_support_ticket".to_string(),
            actor,
            resource_type: "support_ticket".to_string(),
            resource_id: ticket.id.to_string(),
            details: json!({ "subject": ticket.subject }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(ticket)
    }

    /// Append a message to a ticket's log.
    pub async fn append_message(
        &self,
        actor: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        sender: MessageSender,
        content: String,
    ) -> Result<Ticket> {
        if content.trim().is_empty() {
            return Err(SupportError::Validation(
                "message content is required".to_string(),
            ));
        }

        let ticket = self
            .modify(organization_id, id, move |ticket| {
                ticket.append_message(sender, content.clone());
                Ok(())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "add_ticket_message".to_string(),
            actor,
            resource_type: "support_ticket".to_string(),
            resource_id: ticket.id.to_string(),
            details: json!({ "sender": sender.to_string() }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(ticket)
    }

    /// Move a ticket to another status.
    ///
    /// The audit payload carries the subject and a `closed_at` stamp for
    /// every target status, not just `closed`; downstream consumers
    /// depend on that shape.
    pub async fn change_status(
        &self,
        actor: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        status: TicketStatus,
    ) -> Result<Ticket> {
        let ticket = self
            .modify(organization_id, id, move |ticket| {
                ticket.status = status;
                Ok(())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "change_ticket_status".to_string(),
            actor,
            resource_type: "support_ticket".to_string(),
            resource_id: ticket.id.to_string(),
            details: json!({ "subject": ticket.subject, "closed_at": Utc::now() }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(ticket)
    }

    /// Hard-delete a ticket within the organization scope.
    pub async fn delete_ticket(
        &self,
        actor: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<()> {
        let ticket = self.store.fetch(organization_id, id).await?;
        self.store.remove(organization_id, id).await?;

        self.emit_audit(AuditEntry {
            action: "delete_support_ticket".to_string(),
            actor,
            resource_type: "support_ticket".to_string(),
            resource_id: id.to_string(),
            details: json!({ "subject": ticket.subject }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Register a chat integration for the organization.
    pub async fn add_integration(
        &self,
        actor: Option<Uuid>,
        organization_id: Uuid,
        input: ChatIntegrationInput,
    ) -> Result<Vec<ChatIntegration>> {
        input.validate()?;
        let id = Uuid::new_v4();
        let provider = input.provider.clone();

        let settings = self
            .modify_integrations(organization_id, move |list| {
                list.push(input.clone().into_integration(id));
                Ok(())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "add_chat_integration".to_string(),
            actor,
            resource_type: "chat_integration".to_string(),
            resource_id: id.to_string(),
            details: json!({ "provider": provider }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(settings.integrations)
    }

    /// The organization's chat integrations, empty if none registered.
    pub async fn list_integrations(&self, organization_id: Uuid) -> Result<Vec<ChatIntegration>> {
        Ok(self.store.integrations(organization_id).await?.integrations)
    }

    /// Replace the integration at `index`, keeping its stable id.
    pub async fn update_integration(
        &self,
        actor: Option<Uuid>,
        organization_id: Uuid,
        index: usize,
        input: ChatIntegrationInput,
    ) -> Result<Vec<ChatIntegration>> {
        input.validate()?;
        let provider = input.provider.clone();

        let settings = self
            .modify_integrations(organization_id, move |list| {
                let existing = list
                    .get_mut(index)
                    .ok_or(SupportError::IntegrationNotFound(index))?;
                *existing = input.clone().into_integration(existing.id);
                Ok(())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "update_chat_integration".to_string(),
            actor,
            resource_type: "chat_integration".to_string(),
            resource_id: organization_id.to_string(),
            details: json!({ "provider": provider, "index": index }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(settings.integrations)
    }

    /// Remove the integration at `index`.
    pub async fn remove_integration(
        &self,
        actor: Option<Uuid>,
        organization_id: Uuid,
        index: usize,
    ) -> Result<Vec<ChatIntegration>> {
        let settings = self
            .modify_integrations(organization_id, move |list| {
                if index >= list.len() {
                    return Err(SupportError::IntegrationNotFound(index));
                }
                list.remove(index);
                Ok(())
            })
            .await?;

        self.emit_audit(AuditEntry {
            action: "remove_chat_integration".to_string(),
            actor,
            resource_type: "chat_integration".to_string(),
            resource_id: organization_id.to_string(),
            details: json!({ "index": index }),
            organization_id,
            timestamp: Utc::now(),
        })
        .await;

        Ok(settings.integrations)
    }

    /// Counts and first-response average for the organization.
    ///
    /// A point-in-time snapshot; no locks are taken.
    pub async fn statistics(&self, organization_id: Uuid) -> Result<TicketStatistics> {
        let tickets = self.store.list(organization_id).await?;
        Ok(stats::compute(&tickets))
    }

    /// Fetch-apply-write with a bounded retry on version conflicts.
    async fn modify<F>(&self, organization_id: Uuid, id: Uuid, apply: F) -> Result<Ticket>
    where
        F: Fn(&mut Ticket) -> Result<()>,
    {
        let mut attempts = 0;
        loop {
            let mut ticket = self.store.fetch(organization_id, id).await?;
            apply(&mut ticket)?;
            ticket.updated_at = Utc::now();

            match self.store.update(ticket).await {
                Ok(ticket) => return Ok(ticket),
                Err(SupportError::Conflict(_)) if attempts + 1 < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(ticket = %id, attempts, "retrying conflicted ticket write");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Same discipline as [`Self::modify`], for the integration registry.
    async fn modify_integrations<F>(&self, organization_id: Uuid, apply: F) -> Result<IntegrationSettings>
    where
        F: Fn(&mut Vec<ChatIntegration>) -> Result<()>,
    {
        let mut attempts = 0;
        loop {
            let mut settings = self.store.integrations(organization_id).await?;
            apply(&mut settings.integrations)?;
            settings.updated_at = Utc::now();

            match self.store.put_integrations(settings).await {
                Ok(settings) => return Ok(settings),
                Err(SupportError::Conflict(_)) if attempts + 1 < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(organization = %organization_id, attempts, "retrying conflicted registry write");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn emit_audit(&self, entry: AuditEntry) {
        // Best effort: a failed audit write never fails the operation.
        if let Err(err) = self.audit.record(entry).await {
            tracing::warn!("Failed to record audit entry: {err:#}");
        }
    }
}
