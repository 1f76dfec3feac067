//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` - unified access to all per-aggregate repositories
//! - `TransferUnitOfWork` - transactional scope for multi-aggregate writes
//! - `DomainResult` - standard result type for domain operations

use async_trait::async_trait;

use super::branch::BranchRepository;
use super::item::{Item, ItemRepository};
use super::transfer::{Transfer, TransferRepository};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let item = repos.items().find_by_id(7).await?;
///     let pending = repos.transfers().find_pending_for_branch(2).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn branches(&self) -> &dyn BranchRepository;
    fn items(&self) -> &dyn ItemRepository;
    fn transfers(&self) -> &dyn TransferRepository;

    /// Open a unit of work. Writes made through it become visible only
    /// after [`TransferUnitOfWork::commit`].
    async fn begin(&self) -> DomainResult<Box<dyn TransferUnitOfWork>>;
}

// ── TransferUnitOfWork ──────────────────────────────────────────

/// Transactional scope covering a transfer and the item it moves.
///
/// Dropping a unit of work without committing discards its writes.
#[async_trait]
pub trait TransferUnitOfWork: Send {
    /// Load a transfer for modification. Backends that support row locks
    /// hold one on the row until commit or rollback.
    async fn find_transfer(&mut self, id: i32) -> DomainResult<Option<Transfer>>;

    async fn find_item(&mut self, id: i32) -> DomainResult<Option<Item>>;

    async fn update_item(&mut self, item: &Item) -> DomainResult<()>;

    /// Version-checked update; returns the transfer with its new version.
    async fn update_transfer(&mut self, transfer: &Transfer) -> DomainResult<Transfer>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}
