//! Transfer repository interface

use async_trait::async_trait;

use super::model::{Transfer, TransferFilter};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

#[async_trait]
pub trait TransferRepository: Send + Sync {
    /// Allocate a transfer number not used by any stored transfer
    async fn generate_number(&self) -> DomainResult<String>;

    /// Persist a new transfer, returning it with its assigned id
    async fn create(&self, transfer: Transfer) -> DomainResult<Transfer>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transfer>>;

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Transfer>>;

    /// The transfer of `item_id` that has not yet completed or been cancelled
    async fn find_active_for_item(&self, item_id: i32) -> DomainResult<Option<Transfer>>;

    /// Version-checked update. Fails with `ConcurrentModification` when the
    /// stored version differs from `transfer.version`.
    async fn update(&self, transfer: Transfer) -> DomainResult<Transfer>;

    /// Newest first, paged
    async fn list(&self, filter: &TransferFilter) -> DomainResult<PaginatedResult<Transfer>>;

    /// Transfers leaving or arriving at `branch_id`, newest first, paged
    async fn list_by_branch(
        &self,
        branch_id: i32,
        filter: &TransferFilter,
    ) -> DomainResult<PaginatedResult<Transfer>>;

    async fn find_pending_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>>;

    async fn find_in_transit_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>>;
}
