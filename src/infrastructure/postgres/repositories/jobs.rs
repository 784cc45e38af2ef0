use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::jobs::{InsertJobEntity, JobEntity},
    repositories::jobs::JobRepository,
    value_objects::enums::job_statuses::JobStatus,
};
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::jobs};

pub struct JobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl JobRepository for JobPostgres {
    async fn count_for_user_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = jobs::table
            .filter(jobs::user_id.eq(user_id))
            .filter(jobs::scheduled_start.ge(from))
            .filter(jobs::scheduled_start.lt(to))
            .filter(jobs::status.ne(JobStatus::Cancelled.to_string()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn insert(&self, insert_job_entity: InsertJobEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(jobs::table)
            .values(&insert_job_entity)
            .returning(jobs::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = jobs::table
            .filter(jobs::user_id.eq(user_id))
            .order(jobs::scheduled_start.desc())
            .select(JobEntity::as_select())
            .load::<JobEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_for_user(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = jobs::table
            .filter(jobs::id.eq(job_id))
            .filter(jobs::user_id.eq(user_id))
            .select(JobEntity::as_select())
            .first::<JobEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_status(&self, job_id: Uuid, user_id: Uuid, status: JobStatus) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(jobs::table)
            .filter(jobs::id.eq(job_id))
            .filter(jobs::user_id.eq(user_id))
            .set((
                jobs::status.eq(status.to_string()),
                jobs::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
