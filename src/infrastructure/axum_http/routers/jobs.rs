use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::{entitlements::EntitlementUseCase, jobs::JobUseCase},
    domain::{
        repositories::{
            clients::ClientRepository, jobs::JobRepository,
            plan_configurations::PlanConfigurationRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            jobs::{InsertJobModel, UpdateJobStatusModel},
            plans::FREE_PLAN_ID,
        },
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::error_response},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                clients::ClientPostgres, jobs::JobPostgres,
                plan_configurations::PlanConfigurationPostgres, plans::PlanPostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let job_repository = JobPostgres::new(Arc::clone(&db_pool));
    let client_repository = ClientPostgres::new(Arc::clone(&db_pool));
    let entitlement_usecase = EntitlementUseCase::new(
        Arc::new(PlanConfigurationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        FREE_PLAN_ID,
    );
    let job_usecase = JobUseCase::new(
        Arc::new(job_repository),
        Arc::new(client_repository),
        Arc::new(entitlement_usecase),
    );

    Router::new()
        .route("/", post(create_job))
        .route("/", get(list_jobs))
        .route("/:job_id/status", patch(update_job_status))
        .with_state(Arc::new(job_usecase))
}

pub async fn create_job<J, C, PC, P, S>(
    State(job_usecase): State<Arc<JobUseCase<J, C, PC, P, S>>>,
    auth: AuthUser,
    Json(insert_job_model): Json<InsertJobModel>,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match job_usecase.create_job(auth.user_id, insert_job_model).await {
        Ok(job_id) => (StatusCode::CREATED, Json(json!({ "id": job_id }))).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn list_jobs<J, C, PC, P, S>(
    State(job_usecase): State<Arc<JobUseCase<J, C, PC, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match job_usecase.list_jobs(auth.user_id).await {
        Ok(jobs) => (StatusCode::OK, Json(jobs)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn update_job_status<J, C, PC, P, S>(
    State(job_usecase): State<Arc<JobUseCase<J, C, PC, P, S>>>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(update_job_status_model): Json<UpdateJobStatusModel>,
) -> impl IntoResponse
where
    J: JobRepository + Send + Sync + 'static,
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match job_usecase
        .update_job_status(auth.user_id, job_id, &update_job_status_model.status)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
