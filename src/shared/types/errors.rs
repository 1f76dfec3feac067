use sea_orm::DbErr;
use thiserror::Error;

use crate::domain::transfer::TransferStatus;

/// Coarse classification of a [`DomainError`], used by outer layers to pick
/// a client-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Precondition,
    StateConflict,
    Validation,
    Storage,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(i32),

    #[error("Branch not found: {0}")]
    BranchNotFound(i32),

    #[error("Source and destination branch must differ (branch {0})")]
    SameBranch(i32),

    #[error("Item {0} is not available for transfer")]
    ItemAlreadyInTransfer(i32),

    #[error("Item {item_id} is located at branch {actual}, not branch {requested}")]
    InvalidSourceBranch {
        item_id: i32,
        requested: i32,
        actual: i32,
    },

    #[error("Transfer {number} cannot be approved while {status}")]
    TransferCannotApprove {
        number: String,
        status: TransferStatus,
    },

    #[error("Transfer {number} cannot be shipped while {status}")]
    TransferCannotShip {
        number: String,
        status: TransferStatus,
    },

    #[error("Transfer {number} cannot be received while {status}")]
    TransferCannotReceive {
        number: String,
        status: TransferStatus,
    },

    #[error("Transfer {number} cannot be cancelled while {status}")]
    TransferCannotCancel {
        number: String,
        status: TransferStatus,
    },

    #[error("Transfer {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransferNotFound(_) | Self::ItemNotFound(_) | Self::BranchNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::SameBranch(_)
            | Self::ItemAlreadyInTransfer(_)
            | Self::InvalidSourceBranch { .. } => ErrorKind::Precondition,
            Self::TransferCannotApprove { .. }
            | Self::TransferCannotShip { .. }
            | Self::TransferCannotReceive { .. }
            | Self::TransferCannotCancel { .. }
            | Self::ConcurrentModification(_) => ErrorKind::StateConflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Storage,
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried by the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Database(e) if !matches!(e, DbErr::RecordNotFound(_)))
    }

    /// `true` when a store reported a missing row as an error instead of
    /// returning nothing.
    pub fn is_missing_record(&self) -> bool {
        matches!(self, DomainError::Database(DbErr::RecordNotFound(_)))
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::Validation(errors.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct_per_family() {
        assert_eq!(DomainError::ItemNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::SameBranch(1).kind(), ErrorKind::Precondition);
        assert_eq!(
            DomainError::TransferCannotShip {
                number: "TRF-1".into(),
                status: TransferStatus::Completed,
            }
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            DomainError::ConcurrentModification("TRF-1".into()).kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            DomainError::Database(DbErr::Custom("boom".into())).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn only_storage_errors_are_transient() {
        assert!(DomainError::Database(DbErr::Custom("connection reset".into())).is_transient());
        assert!(!DomainError::Database(DbErr::RecordNotFound("x".into())).is_transient());
        assert!(!DomainError::ItemAlreadyInTransfer(3).is_transient());
    }

    #[test]
    fn display_mentions_status() {
        let err = DomainError::TransferCannotReceive {
            number: "TRF-20260101-ABCDEF01".into(),
            status: TransferStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Transfer TRF-20260101-ABCDEF01 cannot be received while pending"
        );
    }
}
