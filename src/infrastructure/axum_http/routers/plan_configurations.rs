use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    application::usecases::plan_configurations::PlanConfigurationUseCase,
    domain::{
        repositories::{plan_configurations::PlanConfigurationRepository, plans::PlanRepository},
        value_objects::plan_configurations::{
            UpsertPlanConfigurationModel, UpsertPlanConfigurationResponse,
        },
    },
    infrastructure::{
        axum_http::{auth::AdminUser, error_responses::error_response},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                plan_configurations::PlanConfigurationPostgres, plans::PlanPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_configuration_repository = PlanConfigurationPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let plan_configuration_usecase = PlanConfigurationUseCase::new(
        Arc::new(plan_configuration_repository),
        Arc::new(plan_repository),
    );

    Router::new()
        .route("/:user_id", get(get_configuration))
        .route("/:user_id", put(upsert_configuration))
        .with_state(Arc::new(plan_configuration_usecase))
}

pub async fn get_configuration<PC, P>(
    State(plan_configuration_usecase): State<Arc<PlanConfigurationUseCase<PC, P>>>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match plan_configuration_usecase.get_active_for_user(user_id).await {
        Ok(Some(configuration)) => (StatusCode::OK, Json(configuration)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No active configuration"),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn upsert_configuration<PC, P>(
    State(plan_configuration_usecase): State<Arc<PlanConfigurationUseCase<PC, P>>>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(upsert_plan_configuration_model): Json<UpsertPlanConfigurationModel>,
) -> impl IntoResponse
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match plan_configuration_usecase
        .upsert(user_id, upsert_plan_configuration_model)
        .await
    {
        Ok(configuration_id) => (
            StatusCode::OK,
            Json(UpsertPlanConfigurationResponse { configuration_id }),
        )
            .into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
