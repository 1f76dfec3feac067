//! Request DTOs for transfer operations

use serde::Deserialize;
use validator::Validate;

/// Request to move an item between branches
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransferRequest {
    #[validate(range(min = 1, message = "item_id must be >= 1"))]
    pub item_id: i32,
    #[validate(range(min = 1, message = "from_branch_id must be >= 1"))]
    pub from_branch_id: i32,
    #[validate(range(min = 1, message = "to_branch_id must be >= 1"))]
    pub to_branch_id: i32,
    #[validate(range(min = 1, message = "requested_by must be >= 1"))]
    pub requested_by: i32,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApproveTransferRequest {
    #[validate(range(min = 1, message = "approved_by must be >= 1"))]
    pub approved_by: i32,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReceiveTransferRequest {
    #[validate(range(min = 1, message = "received_by must be >= 1"))]
    pub received_by: i32,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelTransferRequest {
    #[validate(range(min = 1, message = "cancelled_by must be >= 1"))]
    pub cancelled_by: i32,
    #[validate(length(min = 1, max = 500, message = "reason must be 1-500 characters"))]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_zero_ids() {
        let req = CreateTransferRequest {
            item_id: 0,
            from_branch_id: 1,
            to_branch_id: 2,
            requested_by: 5,
            notes: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("item_id"));
    }

    #[test]
    fn notes_are_bounded() {
        let req = ApproveTransferRequest {
            approved_by: 1,
            notes: Some("x".repeat(1001)),
        };
        assert!(req.validate().is_err());

        let req = ApproveTransferRequest {
            approved_by: 1,
            notes: Some("x".repeat(1000)),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn cancellation_needs_a_reason() {
        let req = CancelTransferRequest {
            cancelled_by: 3,
            reason: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
