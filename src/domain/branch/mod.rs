//! Branch aggregate
//!
//! Physical shop locations. Only identity and existence matter to transfers.

pub mod model;
pub mod repository;

pub use model::Branch;
pub use repository::BranchRepository;
