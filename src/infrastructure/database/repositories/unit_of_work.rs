//! SeaORM implementation of TransferUnitOfWork
//!
//! Wraps one database transaction. Dropping it uncommitted rolls back.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::domain::{DomainResult, Item, Transfer, TransferUnitOfWork};

use super::item_repository::{find_item, update_item};
use super::transfer_repository::{find_transfer_for_update, update_transfer_versioned};

pub struct SeaOrmUnitOfWork {
    txn: DatabaseTransaction,
}

impl SeaOrmUnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> DomainResult<Self> {
        let txn = db.begin().await?;
        Ok(Self { txn })
    }
}

#[async_trait]
impl TransferUnitOfWork for SeaOrmUnitOfWork {
    async fn find_transfer(&mut self, id: i32) -> DomainResult<Option<Transfer>> {
        find_transfer_for_update(&self.txn, id).await
    }

    async fn find_item(&mut self, id: i32) -> DomainResult<Option<Item>> {
        find_item(&self.txn, id).await
    }

    async fn update_item(&mut self, item: &Item) -> DomainResult<()> {
        update_item(&self.txn, item).await
    }

    async fn update_transfer(&mut self, transfer: &Transfer) -> DomainResult<Transfer> {
        update_transfer_versioned(&self.txn, transfer).await
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Branch, BranchRepository, ItemRepository, ItemStatus, TransferRepository, TransferStatus,
    };
    use crate::infrastructure::database::repositories::{
        SeaOrmBranchRepository, SeaOrmItemRepository, SeaOrmTransferRepository,
    };
    use crate::infrastructure::database::test_utils::migrated_connection;

    async fn seeded(db: &DatabaseConnection) -> (Item, Transfer) {
        let branches = SeaOrmBranchRepository::new(db.clone());
        let items = SeaOrmItemRepository::new(db.clone());
        let transfers = SeaOrmTransferRepository::new(db.clone(), "TRF");
        let a = branches.create(Branch::new("A", "Alpha")).await.unwrap().id;
        let b = branches.create(Branch::new("B", "Beta")).await.unwrap().id;
        let item = items.create(Item::new("RING-1", "Ring", a)).await.unwrap();
        let transfer = transfers
            .create(Transfer::new("TRF-1", item.id, a, b, 1, None))
            .await
            .unwrap();
        (item, transfer)
    }

    #[tokio::test]
    async fn commit_publishes_both_writes() {
        let db = migrated_connection().await;
        let (item, transfer) = seeded(&db).await;

        let mut uow = Box::new(SeaOrmUnitOfWork::begin(&db).await.unwrap());
        let mut t = uow.find_transfer(transfer.id).await.unwrap().unwrap();
        let mut it = uow.find_item(item.id).await.unwrap().unwrap();
        it.dispatch();
        uow.update_item(&it).await.unwrap();
        t.ship(5).unwrap();
        let saved = uow.update_transfer(&t).await.unwrap();
        assert_eq!(saved.version, 1);
        uow.commit().await.unwrap();

        let items = SeaOrmItemRepository::new(db.clone());
        let transfers = SeaOrmTransferRepository::new(db.clone(), "TRF");
        let stored_item = items.find_by_id(item.id).await.unwrap().unwrap();
        let stored = transfers.find_by_id(transfer.id).await.unwrap().unwrap();
        assert_eq!(stored_item.status, ItemStatus::InTransfer);
        assert_eq!(stored.status, TransferStatus::InTransit);
    }

    #[tokio::test]
    async fn rollback_discards_item_write() {
        let db = migrated_connection().await;
        let (item, _) = seeded(&db).await;

        let mut uow = Box::new(SeaOrmUnitOfWork::begin(&db).await.unwrap());
        let mut it = uow.find_item(item.id).await.unwrap().unwrap();
        it.dispatch();
        uow.update_item(&it).await.unwrap();
        uow.rollback().await.unwrap();

        let items = SeaOrmItemRepository::new(db.clone());
        let stored_item = items.find_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(stored_item.status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn dropping_without_commit_discards_writes() {
        let db = migrated_connection().await;
        let (item, _) = seeded(&db).await;

        {
            let mut uow = SeaOrmUnitOfWork::begin(&db).await.unwrap();
            let mut it = uow.find_item(item.id).await.unwrap().unwrap();
            it.relocate(it.branch_id + 1);
            uow.update_item(&it).await.unwrap();
        }

        let items = SeaOrmItemRepository::new(db.clone());
        let stored_item = items.find_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(stored_item.branch_id, item.branch_id);
    }
}
