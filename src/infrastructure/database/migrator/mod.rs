//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240611_000001_create_branches;
mod m20240611_000002_create_items;
mod m20240611_000003_create_transfers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240611_000001_create_branches::Migration),
            Box::new(m20240611_000002_create_items::Migration),
            Box::new(m20240611_000003_create_transfers::Migration),
        ]
    }
}
