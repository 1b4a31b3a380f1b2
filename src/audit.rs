//! Best-effort audit trail for state-changing operations.
//!
//! Entries leave the core through [`AuditSink`] and are never read back:
//! delivery failure is logged and swallowed so the primary operation is
//! unaffected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audit record emitted after a state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Action name, e.g. `create_support_ticket`.
    pub action: String,
    /// Acting user, when the caller supplied one.
    pub actor: Option<Uuid>,
    pub resource_type: String,
    pub resource_id: String,
    /// Free-form payload describing the change.
    pub details: serde_json::Value,
    pub organization_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Destination for audit records.
///
/// Implementations may ship entries anywhere (log pipeline, table,
/// queue). Errors are reported but the service treats delivery as
/// fire-and-forget.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()>;
}

/// [`AuditSink`] that emits entries as structured tracing events.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        tracing::info!(
            action = %entry.action,
            actor = ?entry.actor,
            resource_type = %entry.resource_type,
            resource_id = %entry.resource_id,
            organization = %entry.organization_id,
            details = %entry.details,
            "audit event"
        );
        Ok(())
    }
}
