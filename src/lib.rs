//! # Pawnshop Transfers
//!
//! Moves pawned and inventory items between pawnshop branches through an
//! explicit transfer lifecycle, keeping the transfer record and the item's
//! location and status consistent at every step.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Transfer, item and branch models, repository traits
//! - **application**: The transfer service and its request DTOs
//! - **infrastructure**: SeaORM persistence and the in-memory store
//! - **notifications**: Broadcast of committed transfer events
//! - **config** / **logging**: TOML configuration and tracing setup

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider};

pub use application::TransferService;

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
