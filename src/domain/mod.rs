pub mod branch;
pub mod item;
pub mod repositories;
pub mod transfer;

// Re-export commonly used types
pub use branch::{Branch, BranchRepository};
pub use item::{Item, ItemRepository, ItemStatus};
pub use repositories::{DomainResult, RepositoryProvider, TransferUnitOfWork};
pub use transfer::{Transfer, TransferDetails, TransferFilter, TransferRepository, TransferStatus};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::{DomainError, ErrorKind};
