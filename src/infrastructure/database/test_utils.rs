use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;

use super::migrator::Migrator;
use super::{init_database, DatabaseConfig};

/// Fresh in-memory SQLite database with all migrations applied
pub(crate) async fn migrated_connection() -> DatabaseConnection {
    let db = init_database(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations");
    db
}
