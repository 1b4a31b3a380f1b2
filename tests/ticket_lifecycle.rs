mod common;

use common::{create_input, customer, support_service, FailingAuditSink};
use helpdesk_core::{
    MemoryTicketStore, MessageSender, SupportError, SupportService, TicketCategory,
    TicketPriority, TicketStatus, UpdateTicketInput,
};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn created_tickets_start_open_and_empty() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();

    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, TicketPriority::Medium);
    assert_eq!(ticket.category, TicketCategory::General);
    assert!(ticket.messages.is_empty());
    assert!(!ticket.has_unread_messages);
    assert_eq!(ticket.organization_id, org);
    assert_eq!(ticket.created_at, ticket.updated_at);

    let entry = sink.last();
    assert_eq!(entry.action, "create_support_ticket");
    assert_eq!(entry.organization_id, org);
    assert_eq!(entry.resource_id, ticket.id.to_string());
}

#[tokio::test]
async fn creation_requires_subject_description_and_customer() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();

    let mut input = create_input(org);
    input.subject = String::new();
    assert!(matches!(
        service.create_ticket(None, input).await,
        Err(SupportError::Validation(_))
    ));

    let mut input = create_input(org);
    input.customer = customer("", "a@x.com");
    assert!(matches!(
        service.create_ticket(None, input).await,
        Err(SupportError::Validation(_))
    ));

    // Nothing was persisted and nothing was audited.
    assert!(service.list_tickets(org).await.unwrap().is_empty());
    assert!(sink.entries().is_empty());
}

#[tokio::test]
async fn customer_messages_set_unread_and_support_replies_never_clear_it() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();
    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    let ticket = service
        .append_message(None, ticket.id, org, MessageSender::Customer, "Can't log in".to_string())
        .await
        .unwrap();
    assert!(ticket.has_unread_messages);

    let ticket = service
        .append_message(None, ticket.id, org, MessageSender::Support, "Looking into it".to_string())
        .await
        .unwrap();
    assert!(ticket.has_unread_messages);

    assert_eq!(ticket.messages.len(), 2);
    assert!(ticket.messages[0].read_status);
    assert!(!ticket.messages[1].read_status);
    assert!(ticket.messages[0].timestamp <= ticket.messages[1].timestamp);
}

#[tokio::test]
async fn wrong_organization_always_reads_as_not_found() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();
    let other_org = Uuid::new_v4();
    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    assert!(matches!(
        service.get_ticket(ticket.id, other_org).await,
        Err(SupportError::TicketNotFound(_))
    ));
    assert!(matches!(
        service
            .update_ticket(None, ticket.id, other_org, UpdateTicketInput::default())
            .await,
        Err(SupportError::TicketNotFound(_))
    ));
    assert!(matches!(
        service.delete_ticket(None, ticket.id, other_org).await,
        Err(SupportError::TicketNotFound(_))
    ));
    assert!(matches!(
        service
            .append_message(None, ticket.id, other_org, MessageSender::Support, "hi".to_string())
            .await,
        Err(SupportError::TicketNotFound(_))
    ));

    // The ticket is untouched in its own organization.
    let stored = service.get_ticket(ticket.id, org).await.unwrap();
    assert!(stored.messages.is_empty());
}

#[tokio::test]
async fn update_merges_fields_but_never_the_organization() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();
    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    let updated = service
        .update_ticket(
            None,
            ticket.id,
            org,
            UpdateTicketInput {
                subject: Some("Cannot sign in".to_string()),
                priority: Some(TicketPriority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.subject, "Cannot sign in");
    assert_eq!(updated.priority, TicketPriority::High);
    assert_eq!(updated.description, ticket.description);
    assert!(updated.updated_at > ticket.updated_at);

    let err = service
        .update_ticket(
            None,
            ticket.id,
            org,
            UpdateTicketInput {
                organization_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SupportError::Validation(_)));
}

#[tokio::test]
async fn status_strings_outside_the_four_values_are_rejected() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();
    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    // The string boundary is where invalid statuses can appear.
    let err = "escalated".parse::<TicketStatus>().unwrap_err();
    assert!(matches!(err, SupportError::Validation(_)));

    let stored = service.get_ticket(ticket.id, org).await.unwrap();
    assert_eq!(stored.status, TicketStatus::Open);

    // Valid transitions are unrestricted, including reopening.
    let stored = service
        .change_status(None, ticket.id, org, "closed".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(stored.status, TicketStatus::Closed);
    let stored = service
        .change_status(None, ticket.id, org, TicketStatus::Open)
        .await
        .unwrap();
    assert_eq!(stored.status, TicketStatus::Open);
}

#[tokio::test]
async fn list_orders_by_most_recent_update() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();

    let first = service.create_ticket(None, create_input(org)).await.unwrap();
    let second = service.create_ticket(None, create_input(org)).await.unwrap();

    service
        .append_message(None, first.id, org, MessageSender::Customer, "bump".to_string())
        .await
        .unwrap();

    let listed = service.list_tickets(org).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
}

#[tokio::test]
async fn delete_is_hard_and_scoped() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();
    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();

    service.delete_ticket(None, ticket.id, org).await.unwrap();
    assert!(matches!(
        service.get_ticket(ticket.id, org).await,
        Err(SupportError::TicketNotFound(_))
    ));
    assert!(matches!(
        service.delete_ticket(None, ticket.id, org).await,
        Err(SupportError::TicketNotFound(_))
    ));

    let entry = sink.last();
    assert_eq!(entry.action, "delete_support_ticket");
    assert_eq!(entry.details["subject"], "Login issue");
}

#[tokio::test]
async fn audit_sink_failures_do_not_fail_operations() {
    let service = SupportService::new(
        Arc::new(MemoryTicketStore::new()),
        Arc::new(FailingAuditSink),
    );
    let org = Uuid::new_v4();

    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();
    let ticket = service
        .append_message(None, ticket.id, org, MessageSender::Customer, "hello".to_string())
        .await
        .unwrap();
    service
        .change_status(None, ticket.id, org, TicketStatus::Resolved)
        .await
        .unwrap();
    service.delete_ticket(None, ticket.id, org).await.unwrap();
}
