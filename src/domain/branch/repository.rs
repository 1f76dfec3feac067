//! Branch repository interface

use async_trait::async_trait;

use super::model::Branch;
use crate::domain::DomainResult;

#[async_trait]
pub trait BranchRepository: Send + Sync {
    /// Persist a new branch, returning it with its assigned id
    async fn create(&self, branch: Branch) -> DomainResult<Branch>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>>;

    async fn find_all(&self) -> DomainResult<Vec<Branch>>;
}
