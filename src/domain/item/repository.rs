//! Item repository interface

use async_trait::async_trait;

use super::model::Item;
use crate::domain::DomainResult;

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist a new item, returning it with its assigned id
    async fn create(&self, item: Item) -> DomainResult<Item>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Item>>;

    /// Overwrite status and branch of an existing item
    async fn update(&self, item: Item) -> DomainResult<()>;

    async fn find_by_branch(&self, branch_id: i32) -> DomainResult<Vec<Item>>;
}
