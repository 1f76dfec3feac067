//! Transfer entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored transfer status
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransferStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub transfer_number: String,
    pub item_id: i32,
    pub from_branch_id: i32,
    pub to_branch_id: i32,
    pub status: TransferStatus,

    pub requested_by: i32,
    pub requested_at: DateTimeUtc,
    #[sea_orm(nullable)]
    pub request_notes: Option<String>,

    #[sea_orm(nullable)]
    pub approved_by: Option<i32>,
    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub approval_notes: Option<String>,

    #[sea_orm(nullable)]
    pub shipped_by: Option<i32>,
    #[sea_orm(nullable)]
    pub shipped_at: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub received_by: Option<i32>,
    #[sea_orm(nullable)]
    pub received_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub receipt_notes: Option<String>,

    #[sea_orm(nullable)]
    pub cancelled_by: Option<i32>,
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,

    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::FromBranchId",
        to = "super::branch::Column::Id"
    )]
    FromBranch,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::ToBranchId",
        to = "super::branch::Column::Id"
    )]
    ToBranch,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
