//! Event bus for transfer lifecycle events
//!
//! A tokio broadcast channel. Subscribers either see every transfer or only
//! the one whose number they asked for.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast;

use super::events::{Event, EventMessage};

/// Default channel capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// Broadcasts committed transfer transitions
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    /// A bus buffering `capacity` events per subscriber (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: Event) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let number = message.event.transfer_number().to_string();

        match self.sender.send(message) {
            Ok(count) => debug!(
                "Event published: type={}, transfer={}, subscribers={}",
                event_type, number, count
            ),
            Err(_) => debug!(
                "Event dropped, no subscribers: type={}, transfer={}",
                event_type, number
            ),
        }
    }

    /// Receive events for every transfer
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            transfer_number: None,
        }
    }

    /// Receive only the events of the transfer numbered `number`
    pub fn subscribe_to_transfer(&self, number: impl Into<String>) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            transfer_number: Some(number.into()),
        }
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    transfer_number: Option<String>,
}

impl EventSubscriber {
    /// The transfer this subscriber is limited to, if any
    pub fn transfer_number(&self) -> Option<&str> {
        self.transfer_number.as_deref()
    }

    /// Next matching event, or `None` once the bus is gone.
    /// A lagging subscriber skips the events it missed.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) if self.matches(&msg) => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("Subscriber lagged, {} events missed", count);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, msg: &EventMessage) -> bool {
        self.transfer_number
            .as_deref()
            .map_or(true, |number| msg.event.transfer_number() == number)
    }
}

pub type SharedEventBus = Arc<EventBus>;

/// Shared bus with [`DEFAULT_CAPACITY`]
pub fn create_event_bus() -> SharedEventBus {
    create_event_bus_with_capacity(DEFAULT_CAPACITY)
}

/// Shared bus with a configured capacity
pub fn create_event_bus_with_capacity(capacity: usize) -> SharedEventBus {
    Arc::new(EventBus::with_capacity(capacity))
}
