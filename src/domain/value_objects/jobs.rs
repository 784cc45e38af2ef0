use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::jobs::JobEntity;
use crate::domain::value_objects::enums::job_statuses::JobStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct InsertJobModel {
    pub client_id: Uuid,
    pub title: String,
    pub details: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateJobStatusModel {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct JobDto {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub details: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl From<JobEntity> for JobDto {
    fn from(value: JobEntity) -> Self {
        let status = JobStatus::from_str(&value.status).unwrap_or_default();
        Self {
            id: value.id,
            client_id: value.client_id,
            title: value.title,
            details: value.details,
            scheduled_start: value.scheduled_start,
            scheduled_end: value.scheduled_end,
            status,
            created_at: value.created_at,
        }
    }
}
