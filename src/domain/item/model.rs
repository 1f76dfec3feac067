//! Item domain entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Item availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// On the shelf, free to be moved or sold
    Available,
    /// Held as collateral for an active loan
    Pawned,
    /// Physically travelling between branches
    InTransfer,
    /// Forfeited and listed for sale
    ForSale,
    Sold,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pawned => "pawned",
            Self::InTransfer => "in_transfer",
            Self::ForSale => "for_sale",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical item held at a branch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: i32,
    /// Unique stock code
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub status: ItemStatus,
    /// Branch currently holding the item
    pub branch_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// New, not yet persisted item, available at `branch_id`
    pub fn new(code: impl Into<String>, name: impl Into<String>, branch_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            code: code.into(),
            name: name.into(),
            category: None,
            status: ItemStatus::Available,
            branch_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Available
    }

    /// Mark the item as leaving its branch
    pub fn dispatch(&mut self) {
        self.status = ItemStatus::InTransfer;
        self.updated_at = Utc::now();
    }

    /// Item arrived at `branch_id`
    pub fn relocate(&mut self, branch_id: i32) {
        self.branch_id = branch_id;
        self.status = ItemStatus::Available;
        self.updated_at = Utc::now();
    }

    /// Shipment was called off; the item stays with its current branch
    pub fn restore(&mut self) {
        self.status = ItemStatus::Available;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_available() {
        let item = Item::new("RING-001", "Gold ring", 1);
        assert!(item.is_available());
        assert_eq!(item.branch_id, 1);
    }

    #[test]
    fn relocate_moves_and_frees() {
        let mut item = Item::new("RING-001", "Gold ring", 1);
        item.dispatch();
        assert_eq!(item.status, ItemStatus::InTransfer);
        item.relocate(2);
        assert_eq!(item.branch_id, 2);
        assert!(item.is_available());
    }

    #[test]
    fn restore_keeps_branch() {
        let mut item = Item::new("RING-001", "Gold ring", 1);
        item.dispatch();
        item.restore();
        assert_eq!(item.branch_id, 1);
        assert!(item.is_available());
    }

    #[test]
    fn display_matches_serialized_status() {
        let json = serde_json::to_value(ItemStatus::InTransfer).unwrap();
        assert_eq!(json, ItemStatus::InTransfer.to_string());
        assert_eq!(ItemStatus::ForSale.as_str(), "for_sale");
    }
}
