//! Read-side aggregation over one organization's tickets.
//!
//! Pure functions over an in-memory snapshot: the result is
//! point-in-time, not transactionally consistent with concurrent
//! writers.

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

use crate::models::{MessageSender, Ticket};

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
pub struct TicketStatistics {
    pub total: i64,
    /// Tickets in `open` or `in-progress`.
    pub open: i64,
    /// Tickets in `resolved` or `closed`.
    pub resolved: i64,
    /// Mean time to the earliest support reply, in hours, rounded to two
    /// decimals. `0.0` when no ticket has a support reply.
    pub avg_first_response_hours: f64,
}

/// Aggregate counts and the first-response average over a ticket
/// partition (already filtered to one organization).
pub fn compute(tickets: &[Ticket]) -> TicketStatistics {
    let response_ms: Vec<i64> = tickets.iter().filter_map(first_response_ms).collect();
    let avg_first_response_hours = if response_ms.is_empty() {
        0.0
    } else {
        let avg_ms = response_ms.iter().sum::<i64>() as f64 / response_ms.len() as f64;
        round_two(avg_ms / MS_PER_HOUR)
    };

    TicketStatistics {
        total: tickets.len() as i64,
        open: tickets.iter().filter(|t| t.status.is_open()).count() as i64,
        resolved: tickets.iter().filter(|t| t.status.is_resolved()).count() as i64,
        avg_first_response_hours,
    }
}

/// Milliseconds from ticket creation to the earliest support message.
///
/// `None` for tickets without a support message; those are excluded
/// from the average entirely.
fn first_response_ms(ticket: &Ticket) -> Option<i64> {
    ticket
        .messages
        .iter()
        .filter(|m| m.sender == MessageSender::Support)
        .map(|m| {
            m.timestamp
                .signed_duration_since(ticket.created_at)
                .num_milliseconds()
        })
        .min()
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
