//! In-memory storage implementation
//!
//! Implements every repository plus the unit of work on top of DashMaps.
//! Unit-of-work writes are staged privately and applied under a commit lock
//! after their transfer versions are re-checked. Fault switches let tests
//! make individual writes fail.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::DbErr;

use crate::domain::transfer::{
    transfer_number_candidate, DEFAULT_NUMBER_PREFIX, NUMBER_ATTEMPTS,
};
use crate::domain::{
    Branch, BranchRepository, DomainError, DomainResult, Item, ItemRepository,
    RepositoryProvider, Transfer, TransferFilter, TransferRepository, TransferStatus,
    TransferUnitOfWork,
};
use crate::shared::{validate_pagination, PaginatedResult};

#[derive(Default)]
struct Faults {
    fail_item_updates: AtomicBool,
    fail_transfer_updates: AtomicBool,
    missing_as_error: AtomicBool,
}

struct MemoryState {
    branches: DashMap<i32, Branch>,
    items: DashMap<i32, Item>,
    transfers: DashMap<i32, Transfer>,
    branch_counter: AtomicI32,
    item_counter: AtomicI32,
    transfer_counter: AtomicI32,
    commit_lock: Mutex<()>,
    faults: Faults,
}

impl MemoryState {
    fn new() -> Self {
        Self {
            branches: DashMap::new(),
            items: DashMap::new(),
            transfers: DashMap::new(),
            branch_counter: AtomicI32::new(1),
            item_counter: AtomicI32::new(1),
            transfer_counter: AtomicI32::new(1),
            commit_lock: Mutex::new(()),
            faults: Faults::default(),
        }
    }

    /// Applies the "report missing rows as errors" switch
    fn found<T>(
        &self,
        entity: &str,
        key: impl fmt::Display,
        value: Option<T>,
    ) -> DomainResult<Option<T>> {
        if value.is_none() && self.faults.missing_as_error.load(Ordering::SeqCst) {
            return Err(DomainError::Database(DbErr::RecordNotFound(format!(
                "{} {}",
                entity, key
            ))));
        }
        Ok(value)
    }

    fn item(&self, id: i32) -> DomainResult<Option<Item>> {
        self.found("item", id, self.items.get(&id).map(|i| i.clone()))
    }

    fn transfer(&self, id: i32) -> DomainResult<Option<Transfer>> {
        self.found("transfer", id, self.transfers.get(&id).map(|t| t.clone()))
    }

    fn check_item_write(&self, item: &Item) -> DomainResult<()> {
        if self.faults.fail_item_updates.load(Ordering::SeqCst) {
            return Err(injected("item update"));
        }
        if !self.items.contains_key(&item.id) {
            return Err(DomainError::ItemNotFound(item.id));
        }
        Ok(())
    }

    fn sorted_page(
        &self,
        mut matches: Vec<Transfer>,
        filter: &TransferFilter,
    ) -> PaginatedResult<Transfer> {
        let params = validate_pagination(filter.page, filter.page_size);
        sort_newest_first(&mut matches);
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit as usize)
            .collect();
        PaginatedResult::new(items, total, params.page, params.limit)
    }

    fn for_branch_in(&self, branch_id: i32, status: TransferStatus) -> Vec<Transfer> {
        let mut matches: Vec<Transfer> = self
            .transfers
            .iter()
            .filter(|t| t.involves_branch(branch_id) && t.status == status)
            .map(|t| t.value().clone())
            .collect();
        sort_newest_first(&mut matches);
        matches
    }
}

fn sort_newest_first(transfers: &mut [Transfer]) {
    transfers.sort_by(|a, b| {
        b.requested_at
            .cmp(&a.requested_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn injected(what: &str) -> DomainError {
    DomainError::Database(DbErr::Custom(format!("injected failure: {}", what)))
}

/// In-memory repositories for development and testing
#[derive(Clone)]
pub struct InMemoryRepositoryProvider {
    state: Arc<MemoryState>,
    number_prefix: String,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState::new()),
            number_prefix: DEFAULT_NUMBER_PREFIX.to_string(),
        }
    }

    /// Make every item update fail with a database error
    pub fn fail_item_updates(&self, fail: bool) {
        self.state.faults.fail_item_updates.store(fail, Ordering::SeqCst);
    }

    /// Make every transfer update fail with a database error
    pub fn fail_transfer_updates(&self, fail: bool) {
        self.state
            .faults
            .fail_transfer_updates
            .store(fail, Ordering::SeqCst);
    }

    /// Report absent rows as `RecordNotFound` errors instead of `None`
    pub fn report_missing_as_error(&self, on: bool) {
        self.state.faults.missing_as_error.store(on, Ordering::SeqCst);
    }

    /// Overwrite a stored transfer as-is, bypassing version checks
    pub fn put_transfer(&self, transfer: Transfer) {
        self.state.transfers.insert(transfer.id, transfer);
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── BranchRepository ────────────────────────────────────────────

#[async_trait]
impl BranchRepository for InMemoryRepositoryProvider {
    async fn create(&self, mut branch: Branch) -> DomainResult<Branch> {
        if self.state.branches.iter().any(|b| b.code == branch.code) {
            return Err(DomainError::Database(DbErr::Custom(format!(
                "UNIQUE constraint failed: branches.code ({})",
                branch.code
            ))));
        }
        branch.id = self.state.branch_counter.fetch_add(1, Ordering::SeqCst);
        self.state.branches.insert(branch.id, branch.clone());
        Ok(branch)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>> {
        let branch = self.state.branches.get(&id).map(|b| b.clone());
        self.state.found("branch", id, branch)
    }

    async fn find_all(&self) -> DomainResult<Vec<Branch>> {
        let mut all: Vec<Branch> = self.state.branches.iter().map(|b| b.value().clone()).collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }
}

// ── ItemRepository ──────────────────────────────────────────────

#[async_trait]
impl ItemRepository for InMemoryRepositoryProvider {
    async fn create(&self, mut item: Item) -> DomainResult<Item> {
        if !self.state.branches.contains_key(&item.branch_id) {
            return Err(DomainError::Database(DbErr::Custom(format!(
                "FOREIGN KEY constraint failed: items.branch_id ({})",
                item.branch_id
            ))));
        }
        item.id = self.state.item_counter.fetch_add(1, Ordering::SeqCst);
        self.state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Item>> {
        self.state.item(id)
    }

    async fn update(&self, mut item: Item) -> DomainResult<()> {
        self.state.check_item_write(&item)?;
        item.updated_at = Utc::now();
        self.state.items.insert(item.id, item);
        Ok(())
    }

    async fn find_by_branch(&self, branch_id: i32) -> DomainResult<Vec<Item>> {
        let mut items: Vec<Item> = self
            .state
            .items
            .iter()
            .filter(|i| i.branch_id == branch_id)
            .map(|i| i.value().clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }
}

// ── TransferRepository ──────────────────────────────────────────

#[async_trait]
impl TransferRepository for InMemoryRepositoryProvider {
    async fn generate_number(&self) -> DomainResult<String> {
        for _ in 0..NUMBER_ATTEMPTS {
            let candidate = transfer_number_candidate(&self.number_prefix, Utc::now());
            if !self
                .state
                .transfers
                .iter()
                .any(|t| t.transfer_number == candidate)
            {
                return Ok(candidate);
            }
        }
        Err(DomainError::Database(DbErr::Custom(
            "could not allocate a unique transfer number".to_string(),
        )))
    }

    async fn create(&self, mut transfer: Transfer) -> DomainResult<Transfer> {
        if self
            .state
            .transfers
            .iter()
            .any(|t| t.transfer_number == transfer.transfer_number)
        {
            return Err(DomainError::Database(DbErr::Custom(format!(
                "UNIQUE constraint failed: transfers.transfer_number ({})",
                transfer.transfer_number
            ))));
        }
        transfer.id = self.state.transfer_counter.fetch_add(1, Ordering::SeqCst);
        self.state.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transfer>> {
        self.state.transfer(id)
    }

    async fn find_by_number(&self, number: &str) -> DomainResult<Option<Transfer>> {
        let transfer = self
            .state
            .transfers
            .iter()
            .find(|t| t.transfer_number == number)
            .map(|t| t.value().clone());
        self.state.found("transfer", number, transfer)
    }

    async fn find_active_for_item(&self, item_id: i32) -> DomainResult<Option<Transfer>> {
        Ok(self
            .state
            .transfers
            .iter()
            .find(|t| t.item_id == item_id && t.is_active())
            .map(|t| t.value().clone()))
    }

    async fn update(&self, transfer: Transfer) -> DomainResult<Transfer> {
        let mut uow = Box::new(InMemoryUnitOfWork::new(self.state.clone()));
        let updated = uow.update_transfer(&transfer).await?;
        uow.commit().await?;
        Ok(updated)
    }

    async fn list(&self, filter: &TransferFilter) -> DomainResult<PaginatedResult<Transfer>> {
        let matches = self
            .state
            .transfers
            .iter()
            .filter(|t| filter.matches(t))
            .map(|t| t.value().clone())
            .collect();
        Ok(self.state.sorted_page(matches, filter))
    }

    async fn list_by_branch(
        &self,
        branch_id: i32,
        filter: &TransferFilter,
    ) -> DomainResult<PaginatedResult<Transfer>> {
        let matches = self
            .state
            .transfers
            .iter()
            .filter(|t| t.involves_branch(branch_id) && filter.matches(t))
            .map(|t| t.value().clone())
            .collect();
        Ok(self.state.sorted_page(matches, filter))
    }

    async fn find_pending_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        Ok(self.state.for_branch_in(branch_id, TransferStatus::Pending))
    }

    async fn find_in_transit_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        Ok(self.state.for_branch_in(branch_id, TransferStatus::InTransit))
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn branches(&self) -> &dyn BranchRepository {
        self
    }

    fn items(&self) -> &dyn ItemRepository {
        self
    }

    fn transfers(&self) -> &dyn TransferRepository {
        self
    }

    async fn begin(&self) -> DomainResult<Box<dyn TransferUnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork::new(self.state.clone())))
    }
}

// ── Unit of work ────────────────────────────────────────────────

/// Staged writes against the shared in-memory state
pub struct InMemoryUnitOfWork {
    state: Arc<MemoryState>,
    items: HashMap<i32, Item>,
    /// Staged transfer keyed by id, with the stored version it was based on
    transfers: HashMap<i32, (i32, Transfer)>,
}

impl InMemoryUnitOfWork {
    fn new(state: Arc<MemoryState>) -> Self {
        Self {
            state,
            items: HashMap::new(),
            transfers: HashMap::new(),
        }
    }
}

#[async_trait]
impl TransferUnitOfWork for InMemoryUnitOfWork {
    async fn find_transfer(&mut self, id: i32) -> DomainResult<Option<Transfer>> {
        if let Some((_, staged)) = self.transfers.get(&id) {
            return Ok(Some(staged.clone()));
        }
        self.state.transfer(id)
    }

    async fn find_item(&mut self, id: i32) -> DomainResult<Option<Item>> {
        if let Some(staged) = self.items.get(&id) {
            return Ok(Some(staged.clone()));
        }
        self.state.item(id)
    }

    async fn update_item(&mut self, item: &Item) -> DomainResult<()> {
        self.state.check_item_write(item)?;
        let mut staged = item.clone();
        staged.updated_at = Utc::now();
        self.items.insert(item.id, staged);
        Ok(())
    }

    async fn update_transfer(&mut self, transfer: &Transfer) -> DomainResult<Transfer> {
        if self.state.faults.fail_transfer_updates.load(Ordering::SeqCst) {
            return Err(injected("transfer update"));
        }
        let stored_version = self
            .state
            .transfers
            .get(&transfer.id)
            .map(|t| t.version)
            .ok_or_else(|| DomainError::TransferNotFound(transfer.id.to_string()))?;

        let (base, current) = match self.transfers.get(&transfer.id) {
            Some((base, staged)) => (*base, staged.version),
            None => (stored_version, stored_version),
        };
        if transfer.version != current {
            return Err(DomainError::ConcurrentModification(
                transfer.transfer_number.clone(),
            ));
        }

        let mut updated = transfer.clone();
        updated.version = current + 1;
        updated.updated_at = Utc::now();
        self.transfers.insert(transfer.id, (base, updated.clone()));
        Ok(updated)
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let state = self.state.clone();
        let _guard = state
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (id, (base, staged)) in &self.transfers {
            let stored_version = state.transfers.get(id).map(|t| t.version);
            if stored_version != Some(*base) {
                return Err(DomainError::ConcurrentModification(
                    staged.transfer_number.clone(),
                ));
            }
        }

        let this = *self;
        for (id, item) in this.items {
            state.items.insert(id, item);
        }
        for (id, (_, transfer)) in this.transfers {
            state.transfers.insert(id, transfer);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryRepositoryProvider, Item, Transfer) {
        let repos = InMemoryRepositoryProvider::new();
        let a = BranchRepository::create(&repos, Branch::new("A", "Alpha")).await.unwrap();
        let b = BranchRepository::create(&repos, Branch::new("B", "Beta")).await.unwrap();
        let item = ItemRepository::create(&repos, Item::new("RING-1", "Ring", a.id))
            .await
            .unwrap();
        let number = repos.generate_number().await.unwrap();
        let transfer = TransferRepository::create(
            &repos,
            Transfer::new(number, item.id, a.id, b.id, 1, None),
        )
        .await
        .unwrap();
        (repos, item, transfer)
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let (repos, item, _) = seeded().await;

        let mut uow = repos.begin().await.unwrap();
        let mut it = uow.find_item(item.id).await.unwrap().unwrap();
        it.dispatch();
        uow.update_item(&it).await.unwrap();

        let outside = repos.items().find_by_id(item.id).await.unwrap().unwrap();
        assert!(outside.is_available());

        uow.commit().await.unwrap();
        let after = repos.items().find_by_id(item.id).await.unwrap().unwrap();
        assert!(!after.is_available());
    }

    #[tokio::test]
    async fn second_committer_loses_on_version_conflict() {
        let (repos, _, transfer) = seeded().await;

        let mut first = repos.begin().await.unwrap();
        let mut second = repos.begin().await.unwrap();

        let mut t1 = first.find_transfer(transfer.id).await.unwrap().unwrap();
        let mut t2 = second.find_transfer(transfer.id).await.unwrap().unwrap();
        t1.ship(1).unwrap();
        t2.cancel(2, "race").unwrap();
        first.update_transfer(&t1).await.unwrap();
        second.update_transfer(&t2).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrentModification(_)));

        let stored = repos.transfers().find_by_id(transfer.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransferStatus::InTransit);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn stale_update_is_rejected_immediately() {
        let (repos, _, transfer) = seeded().await;
        let mut newer = transfer.clone();
        newer.approve(3, None).unwrap();
        repos.transfers().update(newer).await.unwrap();

        let mut stale = transfer.clone();
        stale.ship(4).unwrap();
        let err = repos.transfers().update(stale).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrentModification(_)));
    }

    #[tokio::test]
    async fn fault_switches_fail_writes() {
        let (repos, item, transfer) = seeded().await;
        repos.fail_item_updates(true);
        let err = repos.items().update(item.clone()).await.unwrap_err();
        assert!(err.is_transient());
        repos.fail_item_updates(false);

        repos.fail_transfer_updates(true);
        let err = repos.transfers().update(transfer).await.unwrap_err();
        assert!(matches!(err, DomainError::Database(DbErr::Custom(_))));
    }

    #[tokio::test]
    async fn missing_rows_can_be_reported_as_errors() {
        let repos = InMemoryRepositoryProvider::new();
        assert!(repos.items().find_by_id(5).await.unwrap().is_none());
        repos.report_missing_as_error(true);
        let err = repos.items().find_by_id(5).await.unwrap_err();
        assert!(err.is_missing_record());
        let err = repos.transfers().find_by_number("TRF-NOPE").await.unwrap_err();
        assert!(err.is_missing_record());
    }

    #[tokio::test]
    async fn active_transfer_lookup_ignores_finished_ones() {
        let (repos, item, transfer) = seeded().await;
        let open = repos.transfers().find_active_for_item(item.id).await.unwrap();
        assert_eq!(open.map(|t| t.id), Some(transfer.id));

        let mut done = transfer.clone();
        done.cancel(2, "not needed").unwrap();
        repos.transfers().update(done).await.unwrap();
        assert!(repos.transfers().find_active_for_item(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn generated_numbers_use_prefix_and_are_free() {
        let (repos, _, transfer) = seeded().await;
        let number = repos.generate_number().await.unwrap();
        assert!(number.starts_with(DEFAULT_NUMBER_PREFIX));
        assert_ne!(number, transfer.transfer_number);
    }

    #[tokio::test]
    async fn item_creation_requires_branch() {
        let repos = InMemoryRepositoryProvider::new();
        let err = repos
            .items()
            .create(Item::new("X", "Orphan", 9))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Database(_)));
    }
}
