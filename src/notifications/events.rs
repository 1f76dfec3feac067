//! Notification events
//!
//! One event per committed transfer transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    TransferCreated(TransferCreatedEvent),
    TransferApproved(TransferApprovedEvent),
    /// Item left the source branch
    TransferShipped(TransferShippedEvent),
    /// Item arrived and now belongs to the destination branch
    TransferReceived(TransferReceivedEvent),
    TransferCancelled(TransferCancelledEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::TransferCreated(_) => "transfer_created",
            Event::TransferApproved(_) => "transfer_approved",
            Event::TransferShipped(_) => "transfer_shipped",
            Event::TransferReceived(_) => "transfer_received",
            Event::TransferCancelled(_) => "transfer_cancelled",
        }
    }

    pub fn transfer_number(&self) -> &str {
        match self {
            Event::TransferCreated(e) => &e.transfer_number,
            Event::TransferApproved(e) => &e.transfer_number,
            Event::TransferShipped(e) => &e.transfer_number,
            Event::TransferReceived(e) => &e.transfer_number,
            Event::TransferCancelled(e) => &e.transfer_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCreatedEvent {
    pub transfer_id: i32,
    pub transfer_number: String,
    pub item_id: i32,
    pub from_branch_id: i32,
    pub to_branch_id: i32,
    pub requested_by: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferApprovedEvent {
    pub transfer_id: i32,
    pub transfer_number: String,
    pub approved_by: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferShippedEvent {
    pub transfer_id: i32,
    pub transfer_number: String,
    pub item_id: i32,
    pub shipped_by: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceivedEvent {
    pub transfer_id: i32,
    pub transfer_number: String,
    pub item_id: i32,
    pub to_branch_id: i32,
    pub received_by: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCancelledEvent {
    pub transfer_id: i32,
    pub transfer_number: String,
    pub cancelled_by: i32,
    /// Status the transfer was in when it was called off
    pub previous_status: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_type_tag() {
        let message = EventMessage::new(Event::TransferApproved(TransferApprovedEvent {
            transfer_id: 3,
            transfer_number: "TRF-20240611-0000ABCD".into(),
            approved_by: 9,
            timestamp: Utc::now(),
        }));

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "TransferApproved");
        assert_eq!(json["data"]["approved_by"], 9);
        assert!(json["id"].is_string());
    }
}
