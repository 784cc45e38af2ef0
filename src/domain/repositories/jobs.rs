use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::jobs::{InsertJobEntity, JobEntity};
use crate::domain::value_objects::enums::job_statuses::JobStatus;

#[async_trait]
#[automock]
pub trait JobRepository {
    async fn count_for_user_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64>;

    async fn insert(&self, insert_job_entity: InsertJobEntity) -> Result<Uuid>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<JobEntity>>;

    async fn find_for_user(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobEntity>>;

    async fn update_status(&self, job_id: Uuid, user_id: Uuid, status: JobStatus) -> Result<()>;
}
