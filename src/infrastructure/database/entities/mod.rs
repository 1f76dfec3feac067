//! Database entities module

pub mod branch;
pub mod item;
pub mod transfer;

pub use branch::Entity as Branch;
pub use item::Entity as Item;
pub use transfer::Entity as Transfer;
