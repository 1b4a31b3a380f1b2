use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Result, SupportError};

/// Lifecycle status of a support ticket.
///
/// Any status may transition to any other; the model only enforces that
/// the value is one of the four members. Closed tickets can be reopened
/// by a further status change.
#[derive(Debug, Clone, Copy, Default, Enum, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// Statuses counted as "open" by the statistics engine.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Statuses counted as "resolved" by the statistics engine.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Resolved => write!(f, "resolved"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(SupportError::Validation(format!(
                "unknown ticket status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Enum, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for TicketPriority {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(SupportError::Validation(format!(
                "unknown ticket priority: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Enum, Eq, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_category", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum TicketCategory {
    Technical,
    Billing,
    Account,
    #[default]
    General,
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Technical => write!(f, "technical"),
            Self::Billing => write!(f, "billing"),
            Self::Account => write!(f, "account"),
            Self::General => write!(f, "general"),
        }
    }
}

impl FromStr for TicketCategory {
    type Err = SupportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "technical" => Ok(Self::Technical),
            "billing" => Ok(Self::Billing),
            "account" => Ok(Self::Account),
            "general" => Ok(Self::General),
            other => Err(SupportError::Validation(format!(
                "unknown ticket category: {other}"
            ))),
        }
    }
}

/// Which side of the conversation wrote a message.
#[derive(Debug, Clone, Copy, Enum, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageSender {
    Customer,
    Support,
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Support => write!(f, "support"),
        }
    }
}

/// Operational state of a chat-widget integration.
#[derive(Debug, Clone, Copy, Default, Enum, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationStatus {
    #[default]
    Connected,
    Disconnected,
    Error,
}

/// The ticket originator. Immutable identity, embedded in the ticket.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// One entry in a ticket's chronological message log.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Message {
    pub id: Uuid,
    pub sender: MessageSender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// `false` for support-sent messages, `true` for customer-sent ones:
    /// the support-facing log marks incoming customer messages as the
    /// ones needing attention.
    pub read_status: bool,
}

/// One customer support case.
///
/// The aggregate root: identity, classification, the originating
/// customer and the embedded message log. A ticket belongs to exactly
/// one organization for its whole life.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct Ticket {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub customer: Customer,
    /// Append-only; insertion order is chronological order.
    pub messages: Vec<Message>,
    /// Set by customer message appends and only by them. A support reply
    /// does not clear the flag. The asymmetry is current product
    /// behavior, kept pending confirmation that it is intended.
    pub has_unread_messages: bool,
    #[graphql(skip)]
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a fresh ticket from validated creation input.
    pub fn new(input: CreateTicketInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: input.organization_id,
            subject: input.subject,
            description: input.description,
            category: input.category.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            status: TicketStatus::default(),
            customer: input.customer.into(),
            messages: Vec::new(),
            has_unread_messages: false,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to the log and apply the unread rule.
    ///
    /// Prior messages are never touched; a customer send flags the
    /// ticket unread, a support send leaves the flag as it was.
    pub fn append_message(&mut self, sender: MessageSender, content: String) {
        self.messages.push(Message {
            id: Uuid::new_v4(),
            sender,
            content,
            timestamp: Utc::now(),
            read_status: sender == MessageSender::Customer,
        });
        if sender == MessageSender::Customer {
            self.has_unread_messages = true;
        }
    }

    /// Merge the permitted fields of a patch into the ticket.
    ///
    /// The organization scope is immutable: a patch naming a different
    /// organization is rejected before anything is merged.
    pub fn apply_update(&mut self, patch: UpdateTicketInput) -> Result<()> {
        if let Some(org) = patch.organization_id {
            if org != self.organization_id {
                return Err(SupportError::Validation(
                    "organization of a ticket cannot be changed".to_string(),
                ));
            }
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(customer) = patch.customer {
            self.customer = customer.into();
        }
        Ok(())
    }
}

/// A third-party chat-widget configuration.
///
/// Entries carry a stable id: positions in the registry list shift on
/// removal, ids do not.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct ChatIntegration {
    pub id: Uuid,
    pub provider: String,
    pub api_key: Option<String>,
    pub widget_id: Option<String>,
    pub property_id: Option<String>,
    #[graphql(skip)]
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    pub is_active: bool,
    pub status: IntegrationStatus,
}

/// Per-organization chat-integration registry record.
///
/// One record per organization, created empty on the first write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub organization_id: Uuid,
    pub integrations: Vec<ChatIntegration>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationSettings {
    /// An empty registry for an organization that has none stored yet.
    ///
    /// `version` 0 marks a record that has never been persisted; stores
    /// treat an update at version 0 as the initial insert.
    pub fn empty(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            integrations: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

// Input types
#[derive(Debug, Clone, InputObject)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl From<CustomerInput> for Customer {
    fn from(input: CustomerInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            avatar: input.avatar,
        }
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct CreateTicketInput {
    pub organization_id: Uuid,
    pub subject: String,
    pub description: String,
    pub category: Option<TicketCategory>,
    pub priority: Option<TicketPriority>,
    pub customer: CustomerInput,
}

impl CreateTicketInput {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("subject", &self.subject)?;
        require_non_empty("description", &self.description)?;
        require_non_empty("customer.name", &self.customer.name)?;
        require_non_empty("customer.email", &self.customer.email)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateTicketInput {
    /// Accepted only when it matches the ticket's organization.
    pub organization_id: Option<Uuid>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub category: Option<TicketCategory>,
    pub priority: Option<TicketPriority>,
    pub status: Option<TicketStatus>,
    pub customer: Option<CustomerInput>,
}

impl UpdateTicketInput {
    pub fn validate(&self) -> Result<()> {
        if let Some(subject) = &self.subject {
            require_non_empty("subject", subject)?;
        }
        if let Some(description) = &self.description {
            require_non_empty("description", description)?;
        }
        if let Some(customer) = &self.customer {
            require_non_empty("customer.name", &customer.name)?;
            require_non_empty("customer.email", &customer.email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct ChatIntegrationInput {
    pub provider: String,
    pub api_key: Option<String>,
    pub widget_id: Option<String>,
    pub property_id: Option<String>,
    #[graphql(skip)]
    pub config: Option<serde_json::Value>,
    pub is_active: Option<bool>,
    pub status: Option<IntegrationStatus>,
}

impl ChatIntegrationInput {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("provider", &self.provider)
    }

    /// Materialize an integration under the given stable id.
    ///
    /// Used with a fresh id on add and with the existing entry's id on
    /// update, so updates replace every field but never the identity.
    pub fn into_integration(self, id: Uuid) -> ChatIntegration {
        ChatIntegration {
            id,
            provider: self.provider,
            api_key: self.api_key,
            widget_id: self.widget_id,
            property_id: self.property_id,
            config: self.config,
            is_active: self.is_active.unwrap_or(true),
            status: self.status.unwrap_or_default(),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SupportError::Validation(format!("{field} is required")));
    }
    Ok(())
}
