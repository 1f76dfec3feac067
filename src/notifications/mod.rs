//! Notifications module
//!
//! Broadcasts transfer lifecycle events to in-process subscribers.
//!
//! # Usage
//! ```ignore
//! use pawnshop_transfers::notifications::create_event_bus;
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//!
//! while let Some(message) = subscriber.recv().await {
//!     println!("{} {}", message.event.event_type(), message.event.transfer_number());
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{
    create_event_bus, create_event_bus_with_capacity, EventBus, EventSubscriber, SharedEventBus,
    DEFAULT_CAPACITY,
};
pub use events::*;

