mod common;

use common::{create_input, customer, support_service};
use helpdesk_core::{CreateTicketInput, MessageSender, TicketStatus};
use uuid::Uuid;

#[tokio::test]
async fn resolving_a_ticket_moves_it_between_buckets() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();

    let ticket = service
        .create_ticket(
            None,
            CreateTicketInput {
                organization_id: org,
                subject: "Login issue".to_string(),
                description: "Customer cannot sign in".to_string(),
                category: None,
                priority: None,
                customer: customer("A", "a@x.com"),
            },
        )
        .await
        .unwrap();

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

    let before = service.statistics(org).await.unwrap();
    assert_eq!(before.total, 1);
    assert_eq!(before.open, 1);
    assert_eq!(before.resolved, 0);

    service
        .change_status(None, ticket.id, org, TicketStatus::Resolved)
        .await
        .unwrap();

    let after = service.statistics(org).await.unwrap();
    assert_eq!(after.total, 1);
    assert_eq!(after.open, before.open - 1);
    assert_eq!(after.resolved, before.resolved + 1);
}

#[tokio::test]
async fn tickets_without_support_replies_average_to_zero() {
    let (service, _) = support_service();
    let org = Uuid::new_v4();

    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();
    service
        .append_message(None, ticket.id, org, MessageSender::Customer, "anyone there?".to_string())
        .await
        .unwrap();

    let stats = service.statistics(org).await.unwrap();
    assert_eq!(stats.avg_first_response_hours, 0.0);
}

#[tokio::test]
async fn statistics_are_scoped_per_organization() {
    let (service, _) = support_service();
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    service.create_ticket(None, create_input(org_a)).await.unwrap();
    service.create_ticket(None, create_input(org_a)).await.unwrap();

    assert_eq!(service.statistics(org_a).await.unwrap().total, 2);
    assert_eq!(service.statistics(org_b).await.unwrap().total, 0);
}

#[tokio::test]
async fn status_change_audit_carries_subject_and_close_stamp() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let ticket = service
        .create_ticket(Some(actor), create_input(org))
        .await
        .unwrap();

    // The close stamp is recorded for every target status, not just closed.
    service
        .change_status(Some(actor), ticket.id, org, TicketStatus::InProgress)
        .await
        .unwrap();

    let entry = sink.last();
    assert_eq!(entry.action, "change_ticket_status");
    assert_eq!(entry.actor, Some(actor));
    assert_eq!(entry.resource_type, "support_ticket");
    assert_eq!(entry.resource_id, ticket.id.to_string());
    assert_eq!(entry.organization_id, org);
    assert_eq!(entry.details["subject"], "Login issue");
    assert!(entry.details.get("closed_at").is_some());
}

#[tokio::test]
async fn message_appends_are_audited_with_their_sender() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();

    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();
    service
        .append_message(None, ticket.id, org, MessageSender::Support, "on it".to_string())
        .await
        .unwrap();

    let entry = sink.last();
    assert_eq!(entry.action, "add_ticket_message");
    assert_eq!(entry.details["sender"], "support");
}

#[tokio::test]
async fn failed_operations_are_not_audited() {
    let (service, sink) = support_service();
    let org = Uuid::new_v4();

    let ticket = service.create_ticket(None, create_input(org)).await.unwrap();
    let baseline = sink.entries().len();

    let _ = service
        .append_message(None, ticket.id, Uuid::new_v4(), MessageSender::Support, "hi".to_string())
        .await
        .unwrap_err();
    let _ = service
        .append_message(None, ticket.id, org, MessageSender::Support, "".to_string())
        .await
        .unwrap_err();

    assert_eq!(sink.entries().len(), baseline);
}
