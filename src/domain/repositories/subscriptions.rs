use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Current subscription whose status grants a plan and whose period has
    /// not ended.
    async fn find_current_active_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>>;

    async fn insert_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Uuid>;

    async fn cancel_subscription(&self, subscription_id: Uuid) -> Result<()>;
}
