//! SeaORM implementation of TransferRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::domain::transfer::{transfer_number_candidate, NUMBER_ATTEMPTS};
use crate::domain::{
    DomainError, DomainResult, Transfer, TransferFilter, TransferRepository, TransferStatus,
};
use crate::infrastructure::database::entities::transfer;
use crate::shared::{validate_pagination, PaginatedResult};

pub struct SeaOrmTransferRepository {
    db: DatabaseConnection,
    number_prefix: String,
}

impl SeaOrmTransferRepository {
    pub fn new(db: DatabaseConnection, number_prefix: impl Into<String>) -> Self {
        Self {
            db,
            number_prefix: number_prefix.into(),
        }
    }

    async fn paginate(
        &self,
        query: Select<transfer::Entity>,
        filter: &TransferFilter,
    ) -> DomainResult<PaginatedResult<Transfer>> {
        let params = validate_pagination(filter.page, filter.page_size);
        let total = query.clone().count(&self.db).await?;

        let models = query
            .order_by_desc(transfer::Column::RequestedAt)
            .order_by_desc(transfer::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(&self.db)
            .await?;

        let items = models.into_iter().map(model_to_domain).collect();
        Ok(PaginatedResult::new(items, total, params.page, params.limit))
    }

    async fn find_for_branch_in(
        &self,
        branch_id: i32,
        status: TransferStatus,
    ) -> DomainResult<Vec<Transfer>> {
        let models = transfer::Entity::find()
            .filter(branch_condition(branch_id))
            .filter(transfer::Column::Status.eq(status_to_entity(status)))
            .order_by_desc(transfer::Column::RequestedAt)
            .order_by_desc(transfer::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(status: transfer::TransferStatus) -> TransferStatus {
    match status {
        transfer::TransferStatus::Pending => TransferStatus::Pending,
        transfer::TransferStatus::Approved => TransferStatus::Approved,
        transfer::TransferStatus::InTransit => TransferStatus::InTransit,
        transfer::TransferStatus::Completed => TransferStatus::Completed,
        transfer::TransferStatus::Cancelled => TransferStatus::Cancelled,
    }
}

fn status_to_entity(status: TransferStatus) -> transfer::TransferStatus {
    match status {
        TransferStatus::Pending => transfer::TransferStatus::Pending,
        TransferStatus::Approved => transfer::TransferStatus::Approved,
        TransferStatus::InTransit => transfer::TransferStatus::InTransit,
        TransferStatus::Completed => transfer::TransferStatus::Completed,
        TransferStatus::Cancelled => transfer::TransferStatus::Cancelled,
    }
}

fn model_to_domain(m: transfer::Model) -> Transfer {
    Transfer {
        id: m.id,
        transfer_number: m.transfer_number,
        item_id: m.item_id,
        from_branch_id: m.from_branch_id,
        to_branch_id: m.to_branch_id,
        status: status_to_domain(m.status),
        requested_by: m.requested_by,
        requested_at: m.requested_at,
        request_notes: m.request_notes,
        approved_by: m.approved_by,
        approved_at: m.approved_at,
        approval_notes: m.approval_notes,
        shipped_by: m.shipped_by,
        shipped_at: m.shipped_at,
        received_by: m.received_by,
        received_at: m.received_at,
        receipt_notes: m.receipt_notes,
        cancelled_by: m.cancelled_by,
        cancelled_at: m.cancelled_at,
        cancellation_reason: m.cancellation_reason,
        version: m.version,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

/// Every column except the primary key
fn domain_to_active(t: &Transfer) -> transfer::ActiveModel {
    transfer::ActiveModel {
        id: NotSet,
        transfer_number: Set(t.transfer_number.clone()),
        item_id: Set(t.item_id),
        from_branch_id: Set(t.from_branch_id),
        to_branch_id: Set(t.to_branch_id),
        status: Set(status_to_entity(t.status)),
        requested_by: Set(t.requested_by),
        requested_at: Set(t.requested_at),
        request_notes: Set(t.request_notes.clone()),
        approved_by: Set(t.approved_by),
        approved_at: Set(t.approved_at),
        approval_notes: Set(t.approval_notes.clone()),
        shipped_by: Set(t.shipped_by),
        shipped_at: Set(t.shipped_at),
        received_by: Set(t.received_by),
        received_at: Set(t.received_at),
        receipt_notes: Set(t.receipt_notes.clone()),
        cancelled_by: Set(t.cancelled_by),
        cancelled_at: Set(t.cancelled_at),
        cancellation_reason: Set(t.cancellation_reason.clone()),
        version: Set(t.version),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
    }
}

fn apply_filter(mut query: Select<transfer::Entity>, filter: &TransferFilter) -> Select<transfer::Entity> {
    if let Some(status) = filter.status {
        query = query.filter(transfer::Column::Status.eq(status_to_entity(status)));
    }
    if let Some(item_id) = filter.item_id {
        query = query.filter(transfer::Column::ItemId.eq(item_id));
    }
    if let Some(from) = filter.requested_from {
        query = query.filter(transfer::Column::RequestedAt.gte(from));
    }
    if let Some(to) = filter.requested_to {
        query = query.filter(transfer::Column::RequestedAt.lte(to));
    }
    query
}

fn branch_condition(branch_id: i32) -> Condition {
    Condition::any()
        .add(transfer::Column::FromBranchId.eq(branch_id))
        .add(transfer::Column::ToBranchId.eq(branch_id))
}

// ── Connection-generic operations (shared with the unit of work) ─

/// Load a transfer, taking a row lock where the backend supports one.
pub(crate) async fn find_transfer_for_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> DomainResult<Option<Transfer>> {
    let mut query = transfer::Entity::find_by_id(id);
    if conn.get_database_backend() != DbBackend::Sqlite {
        query = query.lock_exclusive();
    }
    let model = query.one(conn).await?;
    Ok(model.map(model_to_domain))
}

/// Write `t` only if the stored row still carries `t.version`.
pub(crate) async fn update_transfer_versioned<C: ConnectionTrait>(
    conn: &C,
    t: &Transfer,
) -> DomainResult<Transfer> {
    debug!(
        "Updating transfer {} (v{}): status={}",
        t.transfer_number, t.version, t.status
    );

    let mut updated = t.clone();
    updated.version = t.version + 1;
    updated.updated_at = Utc::now();

    let result = transfer::Entity::update_many()
        .set(domain_to_active(&updated))
        .filter(transfer::Column::Id.eq(t.id))
        .filter(transfer::Column::Version.eq(t.version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let exists = transfer::Entity::find_by_id(t.id).one(conn).await?.is_some();
        return Err(if exists {
            DomainError::ConcurrentModification(t.transfer_number.clone())
        } else {
            DomainError::TransferNotFound(t.id.to_string())
        });
    }
    Ok(updated)
}

// ── TransferRepository impl ─────────────────────────────────────

#[async_trait]
impl TransferRepository for SeaOrmTransferRepository {
    async fn generate_number(&self) -> DomainResult<String> {
        for _ in 0..NUMBER_ATTEMPTS {
            let candidate = transfer_number_candidate(&self.number_prefix, Utc::now());
            let taken = transfer::Entity::find()
                .filter(transfer::Column::TransferNumber.eq(candidate.as_str()))
                .count(&self.db)
                .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            debug!("Transfer number {} already taken, drawing again", candidate);
        }
        Err(DomainError::Database(DbErr::Custom(
            "could not allocate a unique transfer number".to_string(),
        )))
    }

    async fn create(&self, t: Transfer) -> DomainResult<Transfer> {
        debug!("Creating transfer: {}", t.transfer_number);
        let inserted = domain_to_active(&t).insert(&self.db).await?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transfer>> {
        let model = transfer::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Transfer>> {
        let model = transfer::Entity::find()
            .filter(transfer::Column::TransferNumber.eq(number))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_active_for_item(&self, item_id: i32) -> DomainResult<Option<Transfer>> {
        let model = transfer::Entity::find()
            .filter(transfer::Column::ItemId.eq(item_id))
            .filter(
                transfer::Column::Status.is_in(
                    TransferStatus::ALL
                        .into_iter()
                        .filter(|s| !s.is_terminal())
                        .map(status_to_entity),
                ),
            )
            .order_by_desc(transfer::Column::RequestedAt)
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_domain))
    }

    async fn update(&self, t: Transfer) -> DomainResult<Transfer> {
        update_transfer_versioned(&self.db, &t).await
    }

    async fn list(&self, filter: &TransferFilter) -> DomainResult<PaginatedResult<Transfer>> {
        let query = apply_filter(transfer::Entity::find(), filter);
        self.paginate(query, filter).await
    }

    async fn list_by_branch(
        &self,
        branch_id: i32,
        filter: &TransferFilter,
    ) -> DomainResult<PaginatedResult<Transfer>> {
        let query = apply_filter(
            transfer::Entity::find().filter(branch_condition(branch_id)),
            filter,
        );
        self.paginate(query, filter).await
    }

    async fn find_pending_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        self.find_for_branch_in(branch_id, TransferStatus::Pending)
            .await
    }

    async fn find_in_transit_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        self.find_for_branch_in(branch_id, TransferStatus::InTransit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Branch, BranchRepository, Item, ItemRepository};
    use crate::infrastructure::database::repositories::{
        SeaOrmBranchRepository, SeaOrmItemRepository,
    };
    use crate::infrastructure::database::test_utils::migrated_connection;

    struct Fixture {
        repo: SeaOrmTransferRepository,
        a: i32,
        b: i32,
        c: i32,
        item: i32,
    }

    async fn fixture() -> Fixture {
        let db = migrated_connection().await;
        let branches = SeaOrmBranchRepository::new(db.clone());
        let items = SeaOrmItemRepository::new(db.clone());
        let a = branches.create(Branch::new("A", "Alpha")).await.unwrap().id;
        let b = branches.create(Branch::new("B", "Beta")).await.unwrap().id;
        let c = branches.create(Branch::new("C", "Gamma")).await.unwrap().id;
        let item = items.create(Item::new("RING-1", "Ring", a)).await.unwrap().id;
        Fixture {
            repo: SeaOrmTransferRepository::new(db, "TRF"),
            a,
            b,
            c,
            item,
        }
    }

    async fn create(f: &Fixture, from: i32, to: i32) -> Transfer {
        let number = f.repo.generate_number().await.unwrap();
        f.repo
            .create(Transfer::new(number, f.item, from, to, 1, None))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_find_by_id_and_number() {
        let f = fixture().await;
        let created = create(&f, f.a, f.b).await;
        assert!(created.id > 0);
        assert!(created.transfer_number.starts_with("TRF-"));

        let by_id = f.repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.transfer_number, created.transfer_number);
        assert_eq!(by_id.status, TransferStatus::Pending);

        let by_number = f
            .repo
            .find_by_number(&created.transfer_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, created.id);

        assert!(f.repo.find_by_id(999).await.unwrap().is_none());
        assert!(f.repo.find_by_number("TRF-NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_copies() {
        let f = fixture().await;
        let created = create(&f, f.a, f.b).await;

        let mut first = created.clone();
        first.approve(2, Some("fine".into())).unwrap();
        let saved = f.repo.update(first).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut stale = created.clone();
        stale.ship(3).unwrap();
        let err = f.repo.update(stale).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrentModification(_)));

        let stored = f.repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransferStatus::Pending);
        assert_eq!(stored.approved_by, Some(2));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn update_of_missing_transfer_is_not_found() {
        let f = fixture().await;
        let mut ghost = Transfer::new("TRF-GHOST", f.item, f.a, f.b, 1, None);
        ghost.id = 321;
        let err = f.repo.update(ghost).await.unwrap_err();
        assert!(matches!(err, DomainError::TransferNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_and_pages_newest_first() {
        let f = fixture().await;
        let first = create(&f, f.a, f.b).await;
        let second = create(&f, f.a, f.c).await;
        let third = create(&f, f.b, f.c).await;

        let mut shipped = third.clone();
        shipped.ship(1).unwrap();
        f.repo.update(shipped).await.unwrap();

        let all = f.repo.list(&TransferFilter::default()).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items[0].id, third.id);

        let pending = f
            .repo
            .list(&TransferFilter::default().with_status(TransferStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.total, 2);

        let paged = f
            .repo
            .list(&TransferFilter::default().with_page(2, 2))
            .await
            .unwrap();
        assert_eq!(paged.total, 3);
        assert_eq!(paged.total_pages, 2);
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.items[0].id, first.id);

        let by_branch = f
            .repo
            .list_by_branch(f.c, &TransferFilter::default())
            .await
            .unwrap();
        let ids: Vec<_> = by_branch.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![third.id, second.id]);
    }

    #[tokio::test]
    async fn pending_and_in_transit_match_either_side() {
        let f = fixture().await;
        let outgoing = create(&f, f.a, f.b).await;
        let incoming = create(&f, f.c, f.a).await;

        let mut moving = incoming.clone();
        moving.ship(1).unwrap();
        f.repo.update(moving).await.unwrap();

        let pending = f.repo.find_pending_for_branch(f.a).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, outgoing.id);

        let in_transit = f.repo.find_in_transit_for_branch(f.a).await.unwrap();
        assert_eq!(in_transit.len(), 1);
        assert_eq!(in_transit[0].id, incoming.id);

        assert!(f.repo.find_in_transit_for_branch(f.b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn active_for_item_skips_finished_transfers() {
        let f = fixture().await;
        assert!(f.repo.find_active_for_item(f.item).await.unwrap().is_none());

        let mut done = create(&f, f.a, f.b).await;
        done.cancel(1, "duplicate").unwrap();
        f.repo.update(done).await.unwrap();
        assert!(f.repo.find_active_for_item(f.item).await.unwrap().is_none());

        let open = create(&f, f.a, f.c).await;
        let mut moving = open.clone();
        moving.ship(2).unwrap();
        f.repo.update(moving).await.unwrap();
        let found = f.repo.find_active_for_item(f.item).await.unwrap().unwrap();
        assert_eq!(found.id, open.id);
        assert_eq!(found.status, TransferStatus::InTransit);

        assert!(f.repo.find_active_for_item(f.item + 100).await.unwrap().is_none());
    }
}
