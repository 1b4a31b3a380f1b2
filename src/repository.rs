use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    ChatIntegration, Customer, IntegrationSettings, Message, Ticket, TicketCategory,
    TicketPriority, TicketStatus,
};
use crate::store::TicketStore;
use crate::{Result, SupportError};

/// PostgreSQL-backed [`TicketStore`].
///
/// One row per ticket; the customer and the message log live in JSONB
/// columns so a ticket is read and written as a whole document. The
/// `version` column guards every update (`WHERE version = $n`), which
/// is what keeps a concurrent message append from clobbering a sibling
/// append. Pool acquire timeouts bound store access and surface as
/// retryable [`SupportError::Database`] errors.
pub struct SupportRepository {
    pool: PgPool,
}

impl SupportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ticket_exists(&self, organization_id: Uuid, id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM support_tickets WHERE id = $1 AND organization_id = $2)",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    organization_id: Uuid,
    subject: String,
    description: String,
    category: TicketCategory,
    priority: TicketPriority,
    status: TicketStatus,
    customer: Json<Customer>,
    messages: Json<Vec<Message>>,
    has_unread_messages: bool,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: row.id,
            organization_id: row.organization_id,
            subject: row.subject,
            description: row.description,
            category: row.category,
            priority: row.priority,
            status: row.status,
            customer: row.customer.0,
            messages: row.messages.0,
            has_unread_messages: row.has_unread_messages,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct IntegrationRow {
    organization_id: Uuid,
    integrations: Json<Vec<ChatIntegration>>,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<IntegrationRow> for IntegrationSettings {
    fn from(row: IntegrationRow) -> Self {
        Self {
            organization_id: row.organization_id,
            integrations: row.integrations.0,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl TicketStore for SupportRepository {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            INSERT INTO support_tickets (
                id, organization_id, subject, description, category, priority, status,
                customer, messages, has_unread_messages, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.organization_id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(ticket.category)
        .bind(ticket.priority)
        .bind(ticket.status)
        .bind(Json(&ticket.customer))
        .bind(Json(&ticket.messages))
        .bind(ticket.has_unread_messages)
        .bind(ticket.version)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create support ticket: {}", e);
            SupportError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn fetch(&self, organization_id: Uuid, id: Uuid) -> Result<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM support_tickets WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => SupportError::TicketNotFound(id),
            _ => {
                tracing::error!("Failed to fetch support ticket: {}", e);
                SupportError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    async fn list(&self, organization_id: Uuid) -> Result<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM support_tickets WHERE organization_id = $1 ORDER BY updated_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    async fn update(&self, ticket: Ticket) -> Result<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE support_tickets SET
                subject = $3,
                description = $4,
                category = $5,
                priority = $6,
                status = $7,
                customer = $8,
                messages = $9,
                has_unread_messages = $10,
                updated_at = $11,
                version = version + 1
            WHERE id = $1 AND organization_id = $2 AND version = $12
            RETURNING *
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.organization_id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(ticket.category)
        .bind(ticket.priority)
        .bind(ticket.status)
        .bind(Json(&ticket.customer))
        .bind(Json(&ticket.messages))
        .bind(ticket.has_unread_messages)
        .bind(ticket.updated_at)
        .bind(ticket.version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // No row matched: either the ticket is gone or another writer
            // bumped the version first.
            None => {
                if self.ticket_exists(ticket.organization_id, ticket.id).await? {
                    Err(SupportError::Conflict(ticket.id))
                } else {
                    Err(SupportError::TicketNotFound(ticket.id))
                }
            }
        }
    }

    async fn remove(&self, organization_id: Uuid, id: Uuid) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM support_tickets WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(SupportError::TicketNotFound(id));
        }
        Ok(())
    }

    async fn integrations(&self, organization_id: Uuid) -> Result<IntegrationSettings> {
        let row = sqlx::query_as::<_, IntegrationRow>(
            "SELECT * FROM chat_integration_settings WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(IntegrationSettings::from)
            .unwrap_or_else(|| IntegrationSettings::empty(organization_id)))
    }

    async fn put_integrations(&self, settings: IntegrationSettings) -> Result<IntegrationSettings> {
        let row = if settings.version == 0 {
            sqlx::query_as::<_, IntegrationRow>(
                r#"
                INSERT INTO chat_integration_settings (organization_id, integrations, version, updated_at)
                VALUES ($1, $2, 1, $3)
                ON CONFLICT (organization_id) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(settings.organization_id)
            .bind(Json(&settings.integrations))
            .bind(settings.updated_at)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, IntegrationRow>(
                r#"
                UPDATE chat_integration_settings SET
                    integrations = $2,
                    updated_at = $3,
                    version = version + 1
                WHERE organization_id = $1 AND version = $4
                RETURNING *
                "#,
            )
            .bind(settings.organization_id)
            .bind(Json(&settings.integrations))
            .bind(settings.updated_at)
            .bind(settings.version)
            .fetch_optional(&self.pool)
            .await?
        };

        row.map(IntegrationSettings::from)
            .ok_or(SupportError::Conflict(settings.organization_id))
    }
}
