//! Transfer domain entity
//!
//! ```text
//! Pending ──ship──▶ InTransit ──receive──▶ Completed
//!    │                 │
//!    │  (Approved)─ship┘
//!    └──────┴── cancel ──▶ Cancelled
//! ```
//!
//! Approval stamps metadata on a pending transfer without moving it out of
//! `Pending`, so shipping does not depend on it. `Approved` is still a
//! valid stored state and is handled everywhere `Pending` is.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::branch::Branch;
use crate::domain::item::Item;
use crate::domain::{DomainError, DomainResult};

/// Prefix used for transfer numbers unless configured otherwise
pub const DEFAULT_NUMBER_PREFIX: &str = "TRF";

/// Candidates a store draws before giving up on a unique transfer number
pub const NUMBER_ATTEMPTS: usize = 5;

/// Candidate transfer number: `{prefix}-{YYYYMMDD}-{8 hex}`.
///
/// Stores must still check the candidate against existing rows.
pub fn transfer_number_candidate(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        at.format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}

/// Transfer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Requested, awaiting shipment
    Pending,
    Approved,
    /// Item has left the source branch
    InTransit,
    /// Item received at the destination (terminal)
    Completed,
    /// Called off (terminal)
    Cancelled,
}

impl TransferStatus {
    pub const ALL: [TransferStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::InTransit,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::InTransit => "in_transit",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_approve(&self) -> bool {
        match self {
            Self::Pending => true,
            Self::Approved | Self::InTransit | Self::Completed | Self::Cancelled => false,
        }
    }

    pub fn can_ship(&self) -> bool {
        match self {
            Self::Pending | Self::Approved => true,
            Self::InTransit | Self::Completed | Self::Cancelled => false,
        }
    }

    pub fn can_receive(&self) -> bool {
        match self {
            Self::InTransit => true,
            Self::Pending | Self::Approved | Self::Completed | Self::Cancelled => false,
        }
    }

    pub fn can_cancel(&self) -> bool {
        match self {
            Self::Pending | Self::Approved | Self::InTransit => true,
            Self::Completed | Self::Cancelled => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Completed | Self::Cancelled => true,
            Self::Pending | Self::Approved | Self::InTransit => false,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to move one item from one branch to another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub id: i32,
    /// Human-readable unique number, e.g. "TRF-20240611-9C1E44A0"
    pub transfer_number: String,
    pub item_id: i32,
    pub from_branch_id: i32,
    pub to_branch_id: i32,
    pub status: TransferStatus,

    pub requested_by: i32,
    pub requested_at: DateTime<Utc>,
    pub request_notes: Option<String>,

    pub approved_by: Option<i32>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,

    pub shipped_by: Option<i32>,
    pub shipped_at: Option<DateTime<Utc>>,

    pub received_by: Option<i32>,
    pub received_at: Option<DateTime<Utc>>,
    pub receipt_notes: Option<String>,

    pub cancelled_by: Option<i32>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,

    /// Optimistic concurrency counter, bumped by the store on every update
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// New pending transfer (id is assigned by the store)
    pub fn new(
        transfer_number: impl Into<String>,
        item_id: i32,
        from_branch_id: i32,
        to_branch_id: i32,
        requested_by: i32,
        request_notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            transfer_number: transfer_number.into(),
            item_id,
            from_branch_id,
            to_branch_id,
            status: TransferStatus::Pending,
            requested_by,
            requested_at: now,
            request_notes,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            shipped_by: None,
            shipped_at: None,
            received_by: None,
            received_at: None,
            receipt_notes: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record approval. Status is left untouched.
    pub fn approve(&mut self, approver: i32, notes: Option<String>) -> DomainResult<()> {
        if !self.status.can_approve() {
            return Err(DomainError::TransferCannotApprove {
                number: self.transfer_number.clone(),
                status: self.status,
            });
        }
        self.approved_by = Some(approver);
        self.approved_at = Some(Utc::now());
        self.approval_notes = notes;
        Ok(())
    }

    pub fn ship(&mut self, shipper: i32) -> DomainResult<()> {
        if !self.status.can_ship() {
            return Err(DomainError::TransferCannotShip {
                number: self.transfer_number.clone(),
                status: self.status,
            });
        }
        self.status = TransferStatus::InTransit;
        self.shipped_by = Some(shipper);
        self.shipped_at = Some(Utc::now());
        Ok(())
    }

    pub fn receive(&mut self, receiver: i32, notes: Option<String>) -> DomainResult<()> {
        if !self.status.can_receive() {
            return Err(DomainError::TransferCannotReceive {
                number: self.transfer_number.clone(),
                status: self.status,
            });
        }
        self.status = TransferStatus::Completed;
        self.received_by = Some(receiver);
        self.received_at = Some(Utc::now());
        self.receipt_notes = notes;
        Ok(())
    }

    /// Cancel the transfer, returning the status it was cancelled from.
    pub fn cancel(&mut self, canceller: i32, reason: impl Into<String>) -> DomainResult<TransferStatus> {
        if !self.status.can_cancel() {
            return Err(DomainError::TransferCannotCancel {
                number: self.transfer_number.clone(),
                status: self.status,
            });
        }
        let previous = self.status;
        self.status = TransferStatus::Cancelled;
        self.cancelled_by = Some(canceller);
        self.cancelled_at = Some(Utc::now());
        self.cancellation_reason = Some(reason.into());
        Ok(previous)
    }

    /// Whether the transfer has not reached a terminal state
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether `branch_id` is the source or the destination
    pub fn involves_branch(&self, branch_id: i32) -> bool {
        self.from_branch_id == branch_id || self.to_branch_id == branch_id
    }
}

/// Transfer with its referenced item and branches attached.
///
/// A reference that no longer resolves is left as `None`.
#[derive(Debug, Clone, Serialize)]
pub struct TransferDetails {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub item: Option<Item>,
    pub from_branch: Option<Branch>,
    pub to_branch: Option<Branch>,
}

/// Filter for transfer listings. Page values are clamped by the store.
#[derive(Debug, Clone, Default)]
pub struct TransferFilter {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub status: Option<TransferStatus>,
    pub item_id: Option<i32>,
    /// Inclusive lower bound on `requested_at`
    pub requested_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `requested_at`
    pub requested_to: Option<DateTime<Utc>>,
}

impl TransferFilter {
    pub fn with_status(mut self, status: TransferStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// In-memory evaluation of the non-paging criteria
    pub fn matches(&self, transfer: &Transfer) -> bool {
        self.status.map_or(true, |s| transfer.status == s)
            && self.item_id.map_or(true, |id| transfer.item_id == id)
            && self.requested_from.map_or(true, |from| transfer.requested_at >= from)
            && self.requested_to.map_or(true, |to| transfer.requested_at <= to)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_transfer() -> Transfer {
        Transfer::new("TRF-20240101-00000001", 7, 1, 2, 10, Some("to the mall".into()))
    }

    fn in_status(status: TransferStatus) -> Transfer {
        let mut t = sample_transfer();
        t.status = status;
        t
    }

    #[test]
    fn new_transfer_is_pending() {
        let t = sample_transfer();
        assert_eq!(t.status, TransferStatus::Pending);
        assert!(t.is_active());
        assert!(t.approved_at.is_none());
        assert!(t.shipped_at.is_none());
        assert!(t.received_at.is_none());
        assert!(t.cancelled_at.is_none());
        assert_eq!(t.version, 0);
    }

    #[test]
    fn approve_stamps_metadata_but_keeps_pending() {
        let mut t = sample_transfer();
        t.approve(11, Some("ok".into())).unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
        assert_eq!(t.approved_by, Some(11));
        assert!(t.approved_at.is_some());
        assert_eq!(t.approval_notes.as_deref(), Some("ok"));
    }

    #[test]
    fn approve_only_from_pending() {
        for status in TransferStatus::ALL.into_iter().filter(|s| *s != TransferStatus::Pending) {
            let mut t = in_status(status);
            let err = t.approve(11, None).unwrap_err();
            assert!(matches!(err, DomainError::TransferCannotApprove { .. }));
            assert!(t.approved_at.is_none());
        }
    }

    #[test]
    fn ship_then_receive_completes() {
        let mut t = sample_transfer();
        t.ship(12).unwrap();
        assert_eq!(t.status, TransferStatus::InTransit);
        assert_eq!(t.shipped_by, Some(12));
        assert!(t.shipped_at.is_some());

        t.receive(42, Some("arrived intact".into())).unwrap();
        assert_eq!(t.status, TransferStatus::Completed);
        assert_eq!(t.received_by, Some(42));
        assert!(t.received_at.is_some());
        assert!(!t.is_active());
    }

    #[test]
    fn ship_allowed_from_pending_and_approved_only() {
        for status in TransferStatus::ALL {
            let mut t = in_status(status);
            let result = t.ship(1);
            assert_eq!(result.is_ok(), status.can_ship(), "{status}");
            if let Err(err) = result {
                assert!(matches!(err, DomainError::TransferCannotShip { .. }));
                assert_eq!(t.status, status);
                assert!(t.shipped_at.is_none());
            }
        }
    }

    #[test]
    fn receive_requires_in_transit() {
        for status in TransferStatus::ALL.into_iter().filter(|s| *s != TransferStatus::InTransit) {
            let mut t = in_status(status);
            let err = t.receive(42, None).unwrap_err();
            assert!(matches!(err, DomainError::TransferCannotReceive { .. }));
            assert_eq!(t.status, status);
            assert!(t.received_at.is_none());
        }
    }

    #[test]
    fn cancel_reports_previous_status() {
        let mut t = in_status(TransferStatus::InTransit);
        let previous = t.cancel(5, "damaged in transit").unwrap();
        assert_eq!(previous, TransferStatus::InTransit);
        assert_eq!(t.status, TransferStatus::Cancelled);
        assert_eq!(t.cancelled_by, Some(5));
        assert_eq!(t.cancellation_reason.as_deref(), Some("damaged in transit"));
        assert!(t.cancelled_at.is_some());
    }

    #[test]
    fn cancel_rejected_from_terminal_states() {
        for status in [TransferStatus::Completed, TransferStatus::Cancelled] {
            let mut t = in_status(status);
            let err = t.cancel(5, "too late").unwrap_err();
            assert!(matches!(err, DomainError::TransferCannotCancel { .. }));
            assert_eq!(t.status, status);
            assert!(t.cancellation_reason.is_none());
        }
    }

    #[test]
    fn capability_table() {
        assert!(TransferStatus::Approved.can_cancel());
        assert!(TransferStatus::Approved.can_ship());
        assert!(!TransferStatus::Approved.can_approve());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
        assert!(!TransferStatus::InTransit.is_terminal());
    }

    #[test]
    fn display_matches_serialized_status() {
        for status in TransferStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn number_candidate_format() {
        let at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 6, 11, 9, 30, 0).unwrap();
        let number = transfer_number_candidate("TRF", at);
        assert!(number.starts_with("TRF-20240611-"), "{number}");
        let suffix = &number["TRF-20240611-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        assert_ne!(number, transfer_number_candidate("TRF", at));
    }

    #[test]
    fn involves_either_branch() {
        let t = sample_transfer();
        assert!(t.involves_branch(1));
        assert!(t.involves_branch(2));
        assert!(!t.involves_branch(3));
    }

    #[test]
    fn filter_matches_status_item_and_range() {
        let t = sample_transfer();
        assert!(TransferFilter::default().matches(&t));
        assert!(TransferFilter::default()
            .with_status(TransferStatus::Pending)
            .matches(&t));
        assert!(!TransferFilter::default()
            .with_status(TransferStatus::Completed)
            .matches(&t));

        let filter = TransferFilter {
            item_id: Some(8),
            ..Default::default()
        };
        assert!(!filter.matches(&t));

        let filter = TransferFilter {
            requested_from: Some(t.requested_at - Duration::minutes(1)),
            requested_to: Some(t.requested_at),
            ..Default::default()
        };
        assert!(filter.matches(&t));

        let filter = TransferFilter {
            requested_from: Some(t.requested_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!filter.matches(&t));
    }
}
