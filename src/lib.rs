//! # helpdesk-core
//!
//! Organization-scoped support ticketing core.
//!
//! ## Features
//!
//! - **Support Tickets** - Tickets with categories, priorities, statuses
//! - **Threaded Messages** - Append-only per-ticket message log with unread tracking
//! - **Organization Scoping** - Every read and write is filtered by organization
//! - **Chat Integrations** - Per-organization registry of third-party chat widgets
//! - **Statistics** - Open/resolved counts and average first-response time
//! - **Audit Trail** - Best-effort audit events for every state change
//! - **GraphQL API** - Queries and mutations for ticket management
//! - **Pluggable Storage** - PostgreSQL repository or in-memory store behind one trait
//!
//! ## Usage
//!
//! ### In a Service
//!
//! ```rust,no_run
//! use helpdesk_core::{SupportRepository, SupportService, TracingAuditSink};
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example(db_pool: PgPool) {
//! let store = Arc::new(SupportRepository::new(db_pool));
//! let service = Arc::new(SupportService::new(store, Arc::new(TracingAuditSink::new())));
//!
//! // Add to GraphQL context
//! // Schema::build(QueryRoot, MutationRoot, EmptySubscription)
//! //     .data(service)
//! //     .finish()
//! # }
//! ```
//!
//! ### Models
//!
//! ```rust
//! use helpdesk_core::{CreateTicketInput, CustomerInput, TicketPriority};
//! use uuid::Uuid;
//!
//! let input = CreateTicketInput {
//!     organization_id: Uuid::new_v4(),
//!     subject: "Login issue".to_string(),
//!     description: "Cannot log in to account".to_string(),
//!     category: None,
//!     priority: Some(TicketPriority::High),
//!     customer: CustomerInput {
//!         name: "Ada Lovelace".to_string(),
//!         email: "ada@example.com".to_string(),
//!         avatar: None,
//!     },
//! };
//! ```

pub mod audit;
pub mod graphql;
pub mod models;
pub mod repository;
pub mod service;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use audit::{AuditEntry, AuditSink, TracingAuditSink};
pub use graphql::{SupportMutations, SupportQueries};
pub use models::*;
pub use repository::SupportRepository;
pub use service::SupportService;
pub use stats::TicketStatistics;
pub use store::{MemoryTicketStore, TicketStore};

use thiserror::Error;

/// Support system errors.
///
/// A wrong-organization lookup is reported as [`SupportError::TicketNotFound`],
/// identical to a plain miss, so callers can never probe for tickets that
/// exist under another organization.
#[derive(Error, Debug)]
pub enum SupportError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ticket not found: {0}")]
    TicketNotFound(uuid::Uuid),

    #[error("Chat integration not found at index {0}")]
    IntegrationNotFound(usize),

    #[error("Concurrent write conflict on ticket {0}")]
    Conflict(uuid::Uuid),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl SupportError {
    /// Whether the caller may retry the operation (with backoff).
    ///
    /// Validation and not-found errors are final; store failures and
    /// optimistic-version conflicts are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, SupportError>;
