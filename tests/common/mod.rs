#![allow(dead_code)]

use async_trait::async_trait;
use helpdesk_core::{
    AuditEntry, AuditSink, ChatIntegrationInput, CreateTicketInput, CustomerInput,
    MemoryTicketStore, SupportService,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// An audit sink that keeps every entry for later assertions.
#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn last(&self) -> AuditEntry {
        self.entries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no audit entries recorded")
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// An audit sink that always fails.
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _entry: AuditEntry) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("audit sink unavailable"))
    }
}

/// Build a service over the in-memory store with a recording sink.
pub fn support_service() -> (Arc<SupportService>, Arc<RecordingAuditSink>) {
    let sink = Arc::new(RecordingAuditSink::default());
    let service = Arc::new(SupportService::new(
        Arc::new(MemoryTicketStore::new()),
        sink.clone(),
    ));
    (service, sink)
}

pub fn customer(name: &str, email: &str) -> CustomerInput {
    CustomerInput {
        name: name.to_string(),
        email: email.to_string(),
        avatar: None,
    }
}

pub fn create_input(organization_id: Uuid) -> CreateTicketInput {
    CreateTicketInput {
        organization_id,
        subject: "Login issue".to_string(),
        description: "Can't log in".to_string(),
        category: None,
        priority: None,
        customer: customer("A", "a@x.com"),
    }
}

pub fn integration_input(provider: &str) -> ChatIntegrationInput {
    ChatIntegrationInput {
        provider: provider.to_string(),
        api_key: Some("key".to_string()),
        widget_id: None,
        property_id: None,
        config: None,
        is_active: None,
        status: None,
    }
}
