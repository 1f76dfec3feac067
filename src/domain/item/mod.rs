//! Item aggregate
//!
//! Pawned and inventory goods. The transfer workflow touches only an
//! item's status and branch.

pub mod model;
pub mod repository;

pub use model::{Item, ItemStatus};
pub use repository::ItemRepository;
