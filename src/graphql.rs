//! GraphQL API for the support ticketing core
//!
//! Provides SupportQueries and SupportMutations that can be integrated
//! into any service's GraphQL schema.
//!
//! ## Usage in Services
//!
//! Services should delegate to these query/mutation structs and provide
//! SupportService in the GraphQL context.
//!
//! Authorization checks should be done by the service layer before
//! delegating to these resolvers; the organization id argument is the
//! tenant scope and must come from a trusted source.

use async_graphql::{Context, Object, Result as GraphQLResult};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    ChatIntegration, ChatIntegrationInput, CreateTicketInput, Message, MessageSender, Ticket,
    TicketStatus, UpdateTicketInput,
};
use crate::service::SupportService;
use crate::stats::TicketStatistics;

pub struct SupportQueries;

#[Object(name = "Query", extends)]
impl SupportQueries {
    /// Get a single support ticket by ID, scoped to an organization
    async fn support_ticket(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        organization_id: Uuid,
    ) -> GraphQLResult<Ticket> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service.get_ticket(id, organization_id).await?;
        Ok(ticket)
    }

    /// List an organization's support tickets, most recently updated first
    async fn support_tickets(
        &self,
        ctx: &Context<'_>,
        organization_id: Uuid,
    ) -> GraphQLResult<Vec<Ticket>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let tickets = service.list_tickets(organization_id).await?;
        Ok(tickets)
    }

    /// Get the message log of a ticket
    async fn ticket_messages(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        organization_id: Uuid,
    ) -> GraphQLResult<Vec<Message>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service.get_ticket(id, organization_id).await?;
        Ok(ticket.messages)
    }

    /// List the organization's chat-widget integrations
    async fn chat_integrations(
        &self,
        ctx: &Context<'_>,
        organization_id: Uuid,
    ) -> GraphQLResult<Vec<ChatIntegration>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let integrations = service.list_integrations(organization_id).await?;
        Ok(integrations)
    }

    /// Ticket counts and average first-response time for an organization
    ///
    /// Note: Services should implement admin-only authorization before calling this
    async fn support_statistics(
        &self,
        ctx: &Context<'_>,
        organization_id: Uuid,
    ) -> GraphQLResult<TicketStatistics> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let statistics = service.statistics(organization_id).await?;
        Ok(statistics)
    }
}

pub struct SupportMutations;

#[Object(name = "Mutation", extends)]
impl SupportMutations {
    /// Create a new support ticket
    ///
    /// Note: Services should verify user authentication before calling this
    async fn create_support_ticket(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        input: CreateTicketInput,
    ) -> GraphQLResult<Ticket> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service.create_ticket(actor_id, input).await?;
        Ok(ticket)
    }

    /// Update a support ticket's fields
    ///
    /// Note: Services should implement authorization checks (e.g., support:write permission)
    async fn update_support_ticket(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        input: UpdateTicketInput,
    ) -> GraphQLResult<Ticket> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service
            .update_ticket(actor_id, id, organization_id, input)
            .await?;
        Ok(ticket)
    }

    /// Append a message to a ticket's log
    ///
    /// Note: Services should provide actor_id from authenticated user context
    async fn add_ticket_message(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        sender: MessageSender,
        content: String,
    ) -> GraphQLResult<Ticket> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service
            .append_message(actor_id, id, organization_id, sender, content)
            .await?;
        Ok(ticket)
    }

    /// Move a ticket to another lifecycle status
    async fn change_ticket_status(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
        status: TicketStatus,
    ) -> GraphQLResult<Ticket> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let ticket = service
            .change_status(actor_id, id, organization_id, status)
            .await?;
        Ok(ticket)
    }

    /// Hard-delete a support ticket
    async fn delete_support_ticket(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        id: Uuid,
        organization_id: Uuid,
    ) -> GraphQLResult<bool> {
        let service = ctx.data::<Arc<SupportService>>()?;

        service.delete_ticket(actor_id, id, organization_id).await?;
        Ok(true)
    }

    /// Register a chat-widget integration for an organization
    async fn add_chat_integration(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        organization_id: Uuid,
        input: ChatIntegrationInput,
    ) -> GraphQLResult<Vec<ChatIntegration>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let integrations = service
            .add_integration(actor_id, organization_id, input)
            .await?;
        Ok(integrations)
    }

    /// Replace the chat integration at a list position
    async fn update_chat_integration(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        organization_id: Uuid,
        index: u32,
        input: ChatIntegrationInput,
    ) -> GraphQLResult<Vec<ChatIntegration>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let integrations = service
            .update_integration(actor_id, organization_id, index as usize, input)
            .await?;
        Ok(integrations)
    }

    /// Remove the chat integration at a list position
    async fn remove_chat_integration(
        &self,
        ctx: &Context<'_>,
        actor_id: Option<Uuid>,
        organization_id: Uuid,
        index: u32,
    ) -> GraphQLResult<Vec<ChatIntegration>> {
        let service = ctx.data::<Arc<SupportService>>()?;

        let integrations = service
            .remove_integration(actor_id, organization_id, index as usize)
            .await?;
        Ok(integrations)
    }
}
