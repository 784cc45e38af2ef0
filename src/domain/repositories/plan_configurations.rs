use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plan_configurations::{
    InsertPlanConfigurationEntity, PlanConfigurationEntity,
};

#[async_trait]
#[automock]
pub trait PlanConfigurationRepository {
    async fn find_active_by_user(&self, user_id: Uuid)
    -> Result<Option<PlanConfigurationEntity>>;

    /// Inserts the configuration; when it is active, any other active row for
    /// the same user is deactivated in the same transaction.
    async fn upsert_configuration(
        &self,
        insert_entity: InsertPlanConfigurationEntity,
    ) -> Result<Uuid>;
}
