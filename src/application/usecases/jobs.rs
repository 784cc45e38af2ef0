use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::usecases::entitlements::EntitlementUseCase;
use crate::domain::{
    entities::jobs::InsertJobEntity,
    repositories::{
        clients::ClientRepository, jobs::JobRepository,
        plan_configurations::PlanConfigurationRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        entitlements::{features, limits},
        enums::job_statuses::JobStatus,
        jobs::{InsertJobModel, JobDto},
    },
};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job scheduling is not enabled for this plan")]
    SchedulingDisabled,
    #[error("monthly job limit reached")]
    LimitReached,
    #[error("job title is required")]
    MissingTitle,
    #[error("scheduled end must be after scheduled start")]
    InvalidSchedule,
    #[error("invalid job status: {0}")]
    InvalidStatus(String),
    #[error("job cannot move from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("client not found")]
    ClientNotFound,
    #[error("job not found")]
    NotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl JobError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            JobError::SchedulingDisabled | JobError::LimitReached => StatusCode::FORBIDDEN,
            JobError::MissingTitle | JobError::InvalidSchedule | JobError::InvalidStatus(_) => {
                StatusCode::BAD_REQUEST
            }
            JobError::InvalidTransition { .. } => StatusCode::CONFLICT,
            JobError::ClientNotFound | JobError::NotFound => StatusCode::NOT_FOUND,
            JobError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, JobError>;

pub struct JobUseCase<J, C, PC, P, S>
where
    J: JobRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    client_repo: Arc<C>,
    entitlements: Arc<EntitlementUseCase<PC, P, S>>,
}

impl<J, C, PC, P, S> JobUseCase<J, C, PC, P, S>
where
    J: JobRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(
        job_repo: Arc<J>,
        client_repo: Arc<C>,
        entitlements: Arc<EntitlementUseCase<PC, P, S>>,
    ) -> Self {
        Self {
            job_repo,
            client_repo,
            entitlements,
        }
    }

    pub async fn create_job(&self, user_id: Uuid, model: InsertJobModel) -> UseCaseResult<Uuid> {
        if model.title.trim().is_empty() {
            return Err(JobError::MissingTitle);
        }

        if model.scheduled_end <= model.scheduled_start {
            let err = JobError::InvalidSchedule;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "jobs: rejected job with inverted schedule"
            );
            return Err(err);
        }

        self.ensure_job_quota(user_id, model.scheduled_start).await?;

        self.client_repo
            .find_for_user(model.client_id, user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    client_id = %model.client_id,
                    db_error = ?err,
                    "jobs: failed to load client for job"
                );
                JobError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = JobError::ClientNotFound;
                warn!(
                    %user_id,
                    client_id = %model.client_id,
                    status = err.status_code().as_u16(),
                    "jobs: job references unknown client"
                );
                err
            })?;

        let job_id = self
            .job_repo
            .insert(InsertJobEntity {
                user_id,
                client_id: model.client_id,
                title: model.title.trim().to_string(),
                details: model.details,
                scheduled_start: model.scheduled_start,
                scheduled_end: model.scheduled_end,
                status: JobStatus::Pending.to_string(),
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "jobs: failed to insert job"
                );
                JobError::Internal(err)
            })?;

        info!(%user_id, %job_id, "jobs: job created");

        Ok(job_id)
    }

    pub async fn list_jobs(&self, user_id: Uuid) -> UseCaseResult<Vec<JobDto>> {
        let jobs = self.job_repo.list_for_user(user_id).await.map_err(|err| {
            error!(
                %user_id,
                db_error = ?err,
                "jobs: failed to list jobs"
            );
            JobError::Internal(err)
        })?;

        Ok(jobs.into_iter().map(JobDto::from).collect())
    }

    pub async fn update_job_status(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        requested_status: &str,
    ) -> UseCaseResult<()> {
        let next = JobStatus::from_str(requested_status)
            .ok_or_else(|| JobError::InvalidStatus(requested_status.to_string()))?;

        let job = self
            .job_repo
            .find_for_user(job_id, user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %job_id,
                    db_error = ?err,
                    "jobs: failed to load job"
                );
                JobError::Internal(err)
            })?
            .ok_or(JobError::NotFound)?;

        let current = JobStatus::from_str(&job.status).unwrap_or_default();
        if !current.can_transition_to(next) {
            let err = JobError::InvalidTransition {
                from: current,
                to: next,
            };
            warn!(
                %user_id,
                %job_id,
                from = %current,
                to = %next,
                status = err.status_code().as_u16(),
                "jobs: invalid status transition"
            );
            return Err(err);
        }

        self.job_repo
            .update_status(job_id, user_id, next)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %job_id,
                    db_error = ?err,
                    "jobs: failed to update job status"
                );
                JobError::Internal(err)
            })?;

        info!(%user_id, %job_id, status = %next, "jobs: status updated");

        Ok(())
    }

    async fn ensure_job_quota(
        &self,
        user_id: Uuid,
        scheduled_start: DateTime<Utc>,
    ) -> UseCaseResult<()> {
        let entitlements = self
            .entitlements
            .effective_entitlements(user_id)
            .await
            .map_err(|err| JobError::Internal(err.into()))?;

        if !entitlements.has_feature_or(features::JOB_SCHEDULING, true) {
            let err = JobError::SchedulingDisabled;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "jobs: scheduling disabled by plan"
            );
            return Err(err);
        }

        let (month_start, month_end) = month_window(scheduled_start)?;
        let scheduled_count = self
            .job_repo
            .count_for_user_between(user_id, month_start, month_end)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "jobs: failed to count jobs for month"
                );
                JobError::Internal(err)
            })?;

        if !entitlements.allows_one_more(limits::MAX_JOBS_PER_MONTH, scheduled_count) {
            let err = JobError::LimitReached;
            warn!(
                %user_id,
                scheduled_count,
                limit = entitlements.get_limit(limits::MAX_JOBS_PER_MONTH),
                status = err.status_code().as_u16(),
                "jobs: monthly job limit reached"
            );
            return Err(err);
        }

        Ok(())
    }
}

/// Calendar-month window containing `at`, in UTC.
fn month_window(at: DateTime<Utc>) -> AnyResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start_naive = at
        .date_naive()
        .with_day(1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .context("failed to compute month start")?;
    let start = Utc.from_utc_datetime(&start_naive);
    let end = start
        .checked_add_months(Months::new(1))
        .context("failed to compute month end")?;

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    use crate::domain::{
        entities::{clients::ClientEntity, jobs::JobEntity, plans::PlanEntity},
        repositories::{
            clients::MockClientRepository, jobs::MockJobRepository,
            plan_configurations::MockPlanConfigurationRepository, plans::MockPlanRepository,
            subscriptions::MockSubscriptionRepository,
        },
        value_objects::plans::FREE_PLAN_ID,
    };

    fn entitlement_usecase(
        plan_features: serde_json::Value,
    ) -> Arc<
        EntitlementUseCase<
            MockPlanConfigurationRepository,
            MockPlanRepository,
            MockSubscriptionRepository,
        >,
    > {
        let mut plan_config_repo = MockPlanConfigurationRepository::new();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_| Box::pin(async { Ok(None) }));

        plan_repo.expect_find_by_id().returning(move |id| {
            let features = plan_features.clone();
            Box::pin(async move {
                Ok(PlanEntity {
                    id,
                    name: Some("Free".to_string()),
                    price_minor: 0,
                    features,
                    is_active: true,
                })
            })
        });

        plan_config_repo
            .expect_find_active_by_user()
            .returning(|_| Box::pin(async { Ok(None) }));

        Arc::new(EntitlementUseCase::new(
            Arc::new(plan_config_repo),
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        ))
    }

    fn sample_client(client_id: Uuid, user_id: Uuid) -> ClientEntity {
        let now = Utc::now();
        ClientEntity {
            id: client_id,
            user_id,
            name: "Acme".to_string(),
            email: None,
            phone: None,
            address: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_job(job_id: Uuid, user_id: Uuid, status: JobStatus) -> JobEntity {
        let now = Utc::now();
        JobEntity {
            id: job_id,
            user_id,
            client_id: Uuid::new_v4(),
            title: "Boiler service".to_string(),
            details: None,
            scheduled_start: now + Duration::days(1),
            scheduled_end: now + Duration::days(1) + Duration::hours(2),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn insert_model(client_id: Uuid) -> InsertJobModel {
        let start = Utc::now() + Duration::days(1);
        InsertJobModel {
            client_id,
            title: "Boiler service".to_string(),
            details: None,
            scheduled_start: start,
            scheduled_end: start + Duration::hours(2),
        }
    }

    #[tokio::test]
    async fn create_job_requires_scheduling_feature() {
        let job_repo = MockJobRepository::new();
        let client_repo = MockClientRepository::new();

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({ "job_scheduling": false })),
        );

        let result = usecase
            .create_job(Uuid::new_v4(), insert_model(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(JobError::SchedulingDisabled)));
    }

    #[tokio::test]
    async fn create_job_enforces_monthly_limit() {
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_count_for_user_between()
            .returning(|_, _, _| Box::pin(async { Ok(20) }));
        let client_repo = MockClientRepository::new();

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({ "limits": { "max_jobs_per_month": 20 } })),
        );

        let result = usecase
            .create_job(Uuid::new_v4(), insert_model(Uuid::new_v4()))
            .await;

        assert!(matches!(result, Err(JobError::LimitReached)));
    }

    #[tokio::test]
    async fn create_job_succeeds_for_known_client() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_count_for_user_between()
            .returning(|_, _, _| Box::pin(async { Ok(0) }));
        job_repo
            .expect_insert()
            .withf(move |entity| entity.client_id == client_id && entity.status == "pending")
            .returning(move |_| Box::pin(async move { Ok(job_id) }));

        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_find_for_user()
            .returning(move |id, owner| {
                Box::pin(async move { Ok(Some(sample_client(id, owner))) })
            });

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({})),
        );

        let created = usecase
            .create_job(user_id, insert_model(client_id))
            .await
            .unwrap();

        assert_eq!(created, job_id);
    }

    #[tokio::test]
    async fn create_job_rejects_inverted_schedule() {
        let job_repo = MockJobRepository::new();
        let client_repo = MockClientRepository::new();

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({})),
        );

        let mut model = insert_model(Uuid::new_v4());
        model.scheduled_end = model.scheduled_start - Duration::hours(1);

        let result = usecase.create_job(Uuid::new_v4(), model).await;

        assert!(matches!(result, Err(JobError::InvalidSchedule)));
    }

    #[tokio::test]
    async fn completed_job_cannot_be_reopened() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        job_repo.expect_find_for_user().returning(move |id, owner| {
            Box::pin(async move { Ok(Some(sample_job(id, owner, JobStatus::Completed))) })
        });
        let client_repo = MockClientRepository::new();

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({})),
        );

        let result = usecase
            .update_job_status(user_id, job_id, "in_progress")
            .await;

        assert!(matches!(result, Err(JobError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn pending_job_can_start() {
        let user_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();

        let mut job_repo = MockJobRepository::new();
        job_repo.expect_find_for_user().returning(move |id, owner| {
            Box::pin(async move { Ok(Some(sample_job(id, owner, JobStatus::Pending))) })
        });
        job_repo
            .expect_update_status()
            .withf(|_, _, status| *status == JobStatus::InProgress)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));
        let client_repo = MockClientRepository::new();

        let usecase = JobUseCase::new(
            Arc::new(job_repo),
            Arc::new(client_repo),
            entitlement_usecase(json!({})),
        );

        let result = usecase
            .update_job_status(user_id, job_id, "in_progress")
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn month_window_spans_one_calendar_month() {
        let at = Utc.with_ymd_and_hms(2026, 3, 15, 10, 30, 0).unwrap();

        let (start, end) = month_window(at).unwrap();

        assert_eq!((start.year(), start.month(), start.day()), (2026, 3, 1));
        assert_eq!((end.year(), end.month(), end.day()), (2026, 4, 1));
    }

    #[test]
    fn month_window_rolls_over_year_end() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();

        let (start, end) = month_window(at).unwrap();

        assert_eq!((start.year(), start.month(), start.day()), (2025, 12, 1));
        assert_eq!((end.year(), end.month(), end.day()), (2026, 1, 1));
    }
}
