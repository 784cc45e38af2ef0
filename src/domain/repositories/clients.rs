use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::clients::{ClientEntity, InsertClientEntity, UpdateClientEntity};

#[async_trait]
#[automock]
pub trait ClientRepository {
    async fn count_active_for_user(&self, user_id: Uuid) -> Result<i64>;

    async fn insert(&self, insert_client_entity: InsertClientEntity) -> Result<Uuid>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ClientEntity>>;

    async fn find_for_user(&self, client_id: Uuid, user_id: Uuid)
    -> Result<Option<ClientEntity>>;

    async fn update(
        &self,
        client_id: Uuid,
        user_id: Uuid,
        changes: UpdateClientEntity,
    ) -> Result<bool>;

    async fn archive(&self, client_id: Uuid, user_id: Uuid) -> Result<bool>;
}
