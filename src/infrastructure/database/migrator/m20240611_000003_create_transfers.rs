//! Create transfers table
//!
//! One row per item movement request. `version` backs optimistic
//! concurrency control on lifecycle transitions.

use sea_orm_migration::prelude::*;

use super::m20240611_000001_create_branches::Branches;
use super::m20240611_000002_create_items::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transfers::TransferNumber)
                            .string_len(40)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Transfers::ItemId).integer().not_null())
                    .col(ColumnDef::new(Transfers::FromBranchId).integer().not_null())
                    .col(ColumnDef::new(Transfers::ToBranchId).integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Transfers::RequestedBy).integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::RequestNotes).text())
                    .col(ColumnDef::new(Transfers::ApprovedBy).integer())
                    .col(ColumnDef::new(Transfers::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::ApprovalNotes).text())
                    .col(ColumnDef::new(Transfers::ShippedBy).integer())
                    .col(ColumnDef::new(Transfers::ShippedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::ReceivedBy).integer())
                    .col(ColumnDef::new(Transfers::ReceivedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::ReceiptNotes).text())
                    .col(ColumnDef::new(Transfers::CancelledBy).integer())
                    .col(ColumnDef::new(Transfers::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transfers::CancellationReason).text())
                    .col(
                        ColumnDef::new(Transfers::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transfers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transfers_item")
                            .from(Transfers::Table, Transfers::ItemId)
                            .to(Items::Table, Items::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transfers_from_branch")
                            .from(Transfers::Table, Transfers::FromBranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transfers_to_branch")
                            .from(Transfers::Table, Transfers::ToBranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_status")
                    .table(Transfers::Table)
                    .col(Transfers::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_item")
                    .table(Transfers::Table)
                    .col(Transfers::ItemId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_from_branch")
                    .table(Transfers::Table)
                    .col(Transfers::FromBranchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transfers_to_branch")
                    .table(Transfers::Table)
                    .col(Transfers::ToBranchId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Transfers {
    Table,
    Id,
    TransferNumber,
    ItemId,
    FromBranchId,
    ToBranchId,
    Status,
    RequestedBy,
    RequestedAt,
    RequestNotes,
    ApprovedBy,
    ApprovedAt,
    ApprovalNotes,
    ShippedBy,
    ShippedAt,
    ReceivedBy,
    ReceivedAt,
    ReceiptNotes,
    CancelledBy,
    CancelledAt,
    CancellationReason,
    Version,
    CreatedAt,
    UpdatedAt,
}
