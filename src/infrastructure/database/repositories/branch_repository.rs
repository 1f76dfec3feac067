//! SeaORM implementation of BranchRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set};

use crate::domain::{Branch, BranchRepository, DomainResult};
use crate::infrastructure::database::entities::branch;

pub struct SeaOrmBranchRepository {
    db: DatabaseConnection,
}

impl SeaOrmBranchRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: branch::Model) -> Branch {
    Branch {
        id: m.id,
        code: m.code,
        name: m.name,
        address: m.address,
        is_active: m.is_active,
        created_at: m.created_at,
    }
}

async fn find_branch<C: ConnectionTrait>(conn: &C, id: i32) -> DomainResult<Option<Branch>> {
    let model = branch::Entity::find_by_id(id).one(conn).await?;
    Ok(model.map(model_to_domain))
}

#[async_trait]
impl BranchRepository for SeaOrmBranchRepository {
    async fn create(&self, b: Branch) -> DomainResult<Branch> {
        debug!("Creating branch: {}", b.code);

        let model = branch::ActiveModel {
            id: NotSet,
            code: Set(b.code),
            name: Set(b.name),
            address: Set(b.address),
            is_active: Set(b.is_active),
            created_at: Set(b.created_at),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(model_to_domain(inserted))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Branch>> {
        find_branch(&self.db, id).await
    }

    async fn find_all(&self) -> DomainResult<Vec<Branch>> {
        let models = branch::Entity::find()
            .order_by_asc(branch::Column::Code)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
