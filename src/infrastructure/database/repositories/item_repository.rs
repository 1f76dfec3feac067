//! SeaORM implementation of ItemRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};

use crate::domain::{DomainError, DomainResult, Item, ItemRepository, ItemStatus};
use crate::infrastructure::database::entities::item;

pub struct SeaOrmItemRepository {
    db: DatabaseConnection,
}

impl SeaOrmItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(status: item::ItemStatus) -> ItemStatus {
    match status {
        item::ItemStatus::Available => ItemStatus::Available,
        item::ItemStatus::Pawned => ItemStatus::Pawned,
        item::ItemStatus::InTransfer => ItemStatus::InTransfer,
        item::ItemStatus::ForSale => ItemStatus::ForSale,
        item::ItemStatus::Sold => ItemStatus::Sold,
    }
}

fn status_to_entity(status: ItemStatus) -> item::ItemStatus {
    match status {
        ItemStatus::Available => item::ItemStatus::Available,
        ItemStatus::Pawned => item::ItemStatus::Pawned,
        ItemStatus::InTransfer => item::ItemStatus::InTransfer,
        ItemStatus::ForSale => item::ItemStatus::ForSale,
        ItemStatus::Sold => item::ItemStatus::Sold,
    }
}

fn model_to_domain(m: item::Model) -> Item {
    Item {
        id: m.id,
        code: m.code,
        name: m.name,
        category: m.category,
        status: status_to_domain(m.status),
        branch_id: m.branch_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

// ── Connection-generic operations (shared with the unit of work) ─

pub(crate) async fn find_item<C: ConnectionTrait>(conn: &C, id: i32) -> DomainResult<Option<Item>> {
    let model = item::Entity::find_by_id(id).one(conn).await?;
    Ok(model.map(model_to_domain))
}

pub(crate) async fn update_item<C: ConnectionTrait>(conn: &C, it: &Item) -> DomainResult<()> {
    debug!(
        "Updating item {}: status={}, branch={}",
        it.id, it.status, it.branch_id
    );

    let changes = item::ActiveModel {
        name: Set(it.name.clone()),
        category: Set(it.category.clone()),
        status: Set(status_to_entity(it.status)),
        branch_id: Set(it.branch_id),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    let result = item::Entity::update_many()
        .set(changes)
        .filter(item::Column::Id.eq(it.id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::ItemNotFound(it.id));
    }
    Ok(())
}

// ── ItemRepository impl ─────────────────────────────────────────

#[async_trait]
impl ItemRepository for SeaOrmItemRepository {
    async fn create(&self, it: Item) -> DomainResult<Item> {
        debug!("Creating item: {}", it.code);

        let model = item::ActiveModel {
            id: NotSet,
            code: Set(it.code),
            name: Set(it.name),
            category: Set(it.category),
            status: Set(status_to_entity(it.status)),
            branch_id: Set(it.branch_id),
            created_at: Set(it.created_at),
            updated_at: Set(it.updated_at),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Item>> {
        find_item(&self.db, id).await
    }

    async fn update(&self, it: Item) -> DomainResult<()> {
        update_item(&self.db, &it).await
    }

    async fn find_by_branch(&self, branch_id: i32) -> DomainResult<Vec<Item>> {
        let models = item::Entity::find()
            .filter(item::Column::BranchId.eq(branch_id))
            .order_by_asc(item::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Branch, BranchRepository};
    use crate::infrastructure::database::repositories::SeaOrmBranchRepository;
    use crate::infrastructure::database::test_utils::migrated_connection;

    async fn two_branches(db: &DatabaseConnection) -> (i32, i32) {
        let branches = SeaOrmBranchRepository::new(db.clone());
        let a = branches.create(Branch::new("A", "Alpha")).await.unwrap();
        let b = branches.create(Branch::new("B", "Beta")).await.unwrap();
        (a.id, b.id)
    }

    #[tokio::test]
    async fn update_changes_status_and_branch() {
        let db = migrated_connection().await;
        let (a, b) = two_branches(&db).await;
        let repo = SeaOrmItemRepository::new(db);

        let mut ring = repo.create(Item::new("RING-1", "Gold ring", a)).await.unwrap();
        assert_eq!(ring.status, ItemStatus::Available);

        ring.relocate(b);
        ring.status = ItemStatus::ForSale;
        repo.update(ring.clone()).await.unwrap();

        let stored = repo.find_by_id(ring.id).await.unwrap().unwrap();
        assert_eq!(stored.branch_id, b);
        assert_eq!(stored.status, ItemStatus::ForSale);

        assert!(repo.find_by_branch(a).await.unwrap().is_empty());
        assert_eq!(repo.find_by_branch(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_item_is_not_found() {
        let db = migrated_connection().await;
        let (a, _) = two_branches(&db).await;
        let repo = SeaOrmItemRepository::new(db);

        let mut ghost = Item::new("GHOST", "Nothing", a);
        ghost.id = 404;
        let err = repo.update(ghost).await.unwrap_err();
        assert!(matches!(err, DomainError::ItemNotFound(404)));
    }

    #[tokio::test]
    async fn item_requires_existing_branch() {
        let db = migrated_connection().await;
        let repo = SeaOrmItemRepository::new(db);
        let err = repo
            .create(Item::new("WATCH-1", "Watch", 77))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Database(_)));
    }
}
