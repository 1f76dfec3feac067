//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::domain::branch::BranchRepository;
use crate::domain::item::ItemRepository;
use crate::domain::repositories::{RepositoryProvider, TransferUnitOfWork};
use crate::domain::transfer::{TransferRepository, DEFAULT_NUMBER_PREFIX};
use crate::domain::DomainResult;

use super::branch_repository::SeaOrmBranchRepository;
use super::item_repository::SeaOrmItemRepository;
use super::transfer_repository::SeaOrmTransferRepository;
use super::unit_of_work::SeaOrmUnitOfWork;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let item = repos.items().find_by_id(7).await?;
/// let mut uow = repos.begin().await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    branches: SeaOrmBranchRepository,
    items: SeaOrmItemRepository,
    transfers: SeaOrmTransferRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_number_prefix(db, DEFAULT_NUMBER_PREFIX)
    }

    pub fn with_number_prefix(db: DatabaseConnection, number_prefix: impl Into<String>) -> Self {
        Self {
            branches: SeaOrmBranchRepository::new(db.clone()),
            items: SeaOrmItemRepository::new(db.clone()),
            transfers: SeaOrmTransferRepository::new(db.clone(), number_prefix),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn branches(&self) -> &dyn BranchRepository {
        &self.branches
    }

    fn items(&self) -> &dyn ItemRepository {
        &self.items
    }

    fn transfers(&self) -> &dyn TransferRepository {
        &self.transfers
    }

    async fn begin(&self) -> DomainResult<Box<dyn TransferUnitOfWork>> {
        let uow = SeaOrmUnitOfWork::begin(&self.db).await?;
        Ok(Box::new(uow))
    }
}
