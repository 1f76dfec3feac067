//! Transfer service: moves items between branches
//!
//! Every transition after creation runs inside a single
//! [`TransferUnitOfWork`]: the transfer is reloaded, the model decides
//! whether the move is allowed, the item and transfer writes are staged and
//! one commit publishes both. Any failure rolls the whole unit back.
//! Events are published only after a successful commit.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::application::dto::{
    ApproveTransferRequest, CancelTransferRequest, CreateTransferRequest, ReceiveTransferRequest,
};
use crate::domain::{
    DomainError, DomainResult, RepositoryProvider, Transfer, TransferDetails, TransferFilter,
    TransferStatus, TransferUnitOfWork,
};
use crate::notifications::{
    Event, SharedEventBus, TransferApprovedEvent, TransferCancelledEvent, TransferCreatedEvent,
    TransferReceivedEvent, TransferShippedEvent,
};
use crate::shared::PaginatedResult;

/// Transfer service: the item transfer state machine
pub struct TransferService {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
}

impl TransferService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus) -> Self {
        Self { repos, events }
    }

    // ── Create ──────────────────────────────────────────────────

    /// Request a transfer of an available item away from its current branch.
    pub async fn create(&self, req: CreateTransferRequest) -> DomainResult<Transfer> {
        if req.from_branch_id == req.to_branch_id {
            return Err(DomainError::SameBranch(req.from_branch_id));
        }
        req.validate()?;

        let item = required(self.repos.items().find_by_id(req.item_id).await, || {
            DomainError::ItemNotFound(req.item_id)
        })?;
        if !item.is_available() {
            return Err(DomainError::ItemAlreadyInTransfer(item.id));
        }
        // Creating a transfer leaves the item available, so an open transfer
        // has to be looked up.
        if let Some(open) = self.repos.transfers().find_active_for_item(item.id).await? {
            debug!(
                item_id = item.id,
                transfer = %open.transfer_number,
                "Item already has an open transfer"
            );
            return Err(DomainError::ItemAlreadyInTransfer(item.id));
        }
        if item.branch_id != req.from_branch_id {
            return Err(DomainError::InvalidSourceBranch {
                item_id: item.id,
                requested: req.from_branch_id,
                actual: item.branch_id,
            });
        }
        for branch_id in [req.from_branch_id, req.to_branch_id] {
            required(self.repos.branches().find_by_id(branch_id).await, || {
                DomainError::BranchNotFound(branch_id)
            })?;
        }

        let number = self.repos.transfers().generate_number().await?;
        let transfer = self
            .repos
            .transfers()
            .create(Transfer::new(
                number,
                item.id,
                req.from_branch_id,
                req.to_branch_id,
                req.requested_by,
                req.notes,
            ))
            .await?;

        info!(
            transfer = %transfer.transfer_number,
            item_id = transfer.item_id,
            from = transfer.from_branch_id,
            to = transfer.to_branch_id,
            "Transfer requested"
        );
        record_transition("create");
        self.events.publish(Event::TransferCreated(TransferCreatedEvent {
            transfer_id: transfer.id,
            transfer_number: transfer.transfer_number.clone(),
            item_id: transfer.item_id,
            from_branch_id: transfer.from_branch_id,
            to_branch_id: transfer.to_branch_id,
            requested_by: transfer.requested_by,
            timestamp: transfer.requested_at,
        }));

        Ok(transfer)
    }

    // ── Transitions ─────────────────────────────────────────────

    /// Stamp approval metadata. The transfer stays `pending`.
    pub async fn approve(&self, id: i32, req: ApproveTransferRequest) -> DomainResult<Transfer> {
        req.validate()?;

        let mut uow = self.repos.begin().await?;
        let result = approve_in(uow.as_mut(), id, &req).await;
        let transfer = finish(uow, result).await?;

        info!(transfer = %transfer.transfer_number, approved_by = req.approved_by, "Transfer approved");
        record_transition("approve");
        self.events.publish(Event::TransferApproved(TransferApprovedEvent {
            transfer_id: transfer.id,
            transfer_number: transfer.transfer_number.clone(),
            approved_by: req.approved_by,
            timestamp: transfer.approved_at.unwrap_or_else(Utc::now),
        }));

        Ok(transfer)
    }

    /// Send the item on its way: item becomes `in_transfer`, transfer
    /// becomes `in_transit`.
    pub async fn ship(&self, id: i32, shipped_by: i32) -> DomainResult<Transfer> {
        if shipped_by < 1 {
            return Err(DomainError::Validation("shipped_by must be >= 1".into()));
        }

        let mut uow = self.repos.begin().await?;
        let result = ship_in(uow.as_mut(), id, shipped_by).await;
        let transfer = finish(uow, result).await?;

        info!(
            transfer = %transfer.transfer_number,
            item_id = transfer.item_id,
            shipped_by,
            "Transfer shipped"
        );
        record_transition("ship");
        self.events.publish(Event::TransferShipped(TransferShippedEvent {
            transfer_id: transfer.id,
            transfer_number: transfer.transfer_number.clone(),
            item_id: transfer.item_id,
            shipped_by,
            timestamp: transfer.shipped_at.unwrap_or_else(Utc::now),
        }));

        Ok(transfer)
    }

    /// Book the item in at the destination branch and complete the transfer.
    pub async fn receive(&self, id: i32, req: ReceiveTransferRequest) -> DomainResult<Transfer> {
        req.validate()?;

        let mut uow = self.repos.begin().await?;
        let result = receive_in(uow.as_mut(), id, &req).await;
        let transfer = finish(uow, result).await?;

        info!(
            transfer = %transfer.transfer_number,
            item_id = transfer.item_id,
            branch = transfer.to_branch_id,
            received_by = req.received_by,
            "Transfer received"
        );
        record_transition("receive");
        self.events.publish(Event::TransferReceived(TransferReceivedEvent {
            transfer_id: transfer.id,
            transfer_number: transfer.transfer_number.clone(),
            item_id: transfer.item_id,
            to_branch_id: transfer.to_branch_id,
            received_by: req.received_by,
            timestamp: transfer.received_at.unwrap_or_else(Utc::now),
        }));

        Ok(transfer)
    }

    /// Call the transfer off. An item already in transit is made available
    /// again at the branch it left.
    pub async fn cancel(&self, id: i32, req: CancelTransferRequest) -> DomainResult<Transfer> {
        req.validate()?;

        let mut uow = self.repos.begin().await?;
        let result = cancel_in(uow.as_mut(), id, &req).await;
        let (transfer, previous) = finish(uow, result).await?;

        info!(
            transfer = %transfer.transfer_number,
            previous = %previous,
            cancelled_by = req.cancelled_by,
            "Transfer cancelled"
        );
        record_transition("cancel");
        self.events.publish(Event::TransferCancelled(TransferCancelledEvent {
            transfer_id: transfer.id,
            transfer_number: transfer.transfer_number.clone(),
            cancelled_by: req.cancelled_by,
            previous_status: previous.to_string(),
            reason: req.reason.clone(),
            timestamp: transfer.cancelled_at.unwrap_or_else(Utc::now),
        }));

        Ok(transfer)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get_by_id(&self, id: i32) -> DomainResult<TransferDetails> {
        let transfer = required(self.repos.transfers().find_by_id(id).await, || {
            DomainError::TransferNotFound(id.to_string())
        })?;
        self.attach(transfer).await
    }

    pub async fn get_by_number(&self, number: &str) -> DomainResult<TransferDetails> {
        let transfer = required(self.repos.transfers().find_by_number(number).await, || {
            DomainError::TransferNotFound(number.to_string())
        })?;
        self.attach(transfer).await
    }

    pub async fn list(&self, filter: &TransferFilter) -> DomainResult<PaginatedResult<Transfer>> {
        self.repos.transfers().list(filter).await
    }

    /// Transfers with `branch_id` on either side
    pub async fn list_by_branch(
        &self,
        branch_id: i32,
        filter: &TransferFilter,
    ) -> DomainResult<PaginatedResult<Transfer>> {
        self.repos.transfers().list_by_branch(branch_id, filter).await
    }

    pub async fn pending_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        self.repos.transfers().find_pending_for_branch(branch_id).await
    }

    pub async fn in_transit_for_branch(&self, branch_id: i32) -> DomainResult<Vec<Transfer>> {
        self.repos.transfers().find_in_transit_for_branch(branch_id).await
    }

    async fn attach(&self, transfer: Transfer) -> DomainResult<TransferDetails> {
        let item = optional(self.repos.items().find_by_id(transfer.item_id).await)?;
        let from_branch = optional(self.repos.branches().find_by_id(transfer.from_branch_id).await)?;
        let to_branch = optional(self.repos.branches().find_by_id(transfer.to_branch_id).await)?;
        Ok(TransferDetails {
            transfer,
            item,
            from_branch,
            to_branch,
        })
    }
}

// ── Unit-of-work steps ──────────────────────────────────────────

async fn load_transfer(uow: &mut dyn TransferUnitOfWork, id: i32) -> DomainResult<Transfer> {
    required(uow.find_transfer(id).await, || {
        DomainError::TransferNotFound(id.to_string())
    })
}

async fn approve_in(
    uow: &mut dyn TransferUnitOfWork,
    id: i32,
    req: &ApproveTransferRequest,
) -> DomainResult<Transfer> {
    let mut transfer = load_transfer(uow, id).await?;
    transfer.approve(req.approved_by, req.notes.clone())?;
    uow.update_transfer(&transfer).await
}

async fn ship_in(
    uow: &mut dyn TransferUnitOfWork,
    id: i32,
    shipped_by: i32,
) -> DomainResult<Transfer> {
    let mut transfer = load_transfer(uow, id).await?;
    transfer.ship(shipped_by)?;

    let item_id = transfer.item_id;
    let mut item = required(uow.find_item(item_id).await, || {
        DomainError::ItemNotFound(item_id)
    })?;
    item.dispatch();

    uow.update_item(&item).await?;
    uow.update_transfer(&transfer).await
}

async fn receive_in(
    uow: &mut dyn TransferUnitOfWork,
    id: i32,
    req: &ReceiveTransferRequest,
) -> DomainResult<Transfer> {
    let mut transfer = load_transfer(uow, id).await?;
    transfer.receive(req.received_by, req.notes.clone())?;

    let item_id = transfer.item_id;
    let mut item = required(uow.find_item(item_id).await, || {
        DomainError::ItemNotFound(item_id)
    })?;
    item.relocate(transfer.to_branch_id);

    uow.update_item(&item).await?;
    uow.update_transfer(&transfer).await
}

async fn cancel_in(
    uow: &mut dyn TransferUnitOfWork,
    id: i32,
    req: &CancelTransferRequest,
) -> DomainResult<(Transfer, TransferStatus)> {
    let mut transfer = load_transfer(uow, id).await?;
    let previous = transfer.cancel(req.cancelled_by, req.reason.clone())?;

    // The transfer's own status decides whether the item is in motion.
    if previous == TransferStatus::InTransit {
        let item_id = transfer.item_id;
        let mut item = required(uow.find_item(item_id).await, || {
            DomainError::ItemNotFound(item_id)
        })?;
        item.restore();
        uow.update_item(&item).await?;
    }

    let transfer = uow.update_transfer(&transfer).await?;
    Ok((transfer, previous))
}

/// Commit on success, roll back on failure. The step's error wins over a
/// rollback error.
async fn finish<T: Send>(
    uow: Box<dyn TransferUnitOfWork>,
    result: DomainResult<T>,
) -> DomainResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, cause = %err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────

/// A row that must exist. Missing rows reported either as `None` or as a
/// store "record not found" error both become `missing()`.
fn required<T>(
    found: DomainResult<Option<T>>,
    missing: impl FnOnce() -> DomainError,
) -> DomainResult<T> {
    match found {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(missing()),
        Err(err) if err.is_missing_record() => Err(missing()),
        Err(err) => Err(err),
    }
}

/// A row that may be absent without failing the caller
fn optional<T>(found: DomainResult<Option<T>>) -> DomainResult<Option<T>> {
    match found {
        Err(err) if err.is_missing_record() => Ok(None),
        other => other,
    }
}

fn record_transition(transition: &'static str) {
    metrics::counter!("pawnshop_transfer_transitions_total", "transition" => transition)
        .increment(1);
}
