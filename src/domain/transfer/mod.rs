//! Transfer aggregate
//!
//! Contains the Transfer entity with its lifecycle, the query filter,
//! and the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    transfer_number_candidate, Transfer, TransferDetails, TransferFilter, TransferStatus,
    DEFAULT_NUMBER_PREFIX, NUMBER_ATTEMPTS,
};
pub use repository::TransferRepository;
