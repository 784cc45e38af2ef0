use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::usecases::{clients::ClientUseCase, entitlements::EntitlementUseCase},
    domain::{
        repositories::{
            clients::ClientRepository, plan_configurations::PlanConfigurationRepository,
            plans::PlanRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::{
            clients::{InsertClientModel, UpdateClientModel},
            plans::FREE_PLAN_ID,
        },
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::error_response},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                clients::ClientPostgres, plan_configurations::PlanConfigurationPostgres,
                plans::PlanPostgres, subscriptions::SubscriptionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let client_repository = ClientPostgres::new(Arc::clone(&db_pool));
    let entitlement_usecase = EntitlementUseCase::new(
        Arc::new(PlanConfigurationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PlanPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        FREE_PLAN_ID,
    );
    let client_usecase =
        ClientUseCase::new(Arc::new(client_repository), Arc::new(entitlement_usecase));

    Router::new()
        .route("/", post(create_client))
        .route("/", get(list_clients))
        .route("/:client_id", get(get_client))
        .route("/:client_id", put(update_client))
        .route("/:client_id", delete(archive_client))
        .with_state(Arc::new(client_usecase))
}

pub async fn create_client<C, PC, P, S>(
    State(client_usecase): State<Arc<ClientUseCase<C, PC, P, S>>>,
    auth: AuthUser,
    Json(insert_client_model): Json<InsertClientModel>,
) -> impl IntoResponse
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match client_usecase
        .create_client(auth.user_id, insert_client_model)
        .await
    {
        Ok(client_id) => (StatusCode::CREATED, Json(json!({ "id": client_id }))).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn list_clients<C, PC, P, S>(
    State(client_usecase): State<Arc<ClientUseCase<C, PC, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match client_usecase.list_clients(auth.user_id).await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn get_client<C, PC, P, S>(
    State(client_usecase): State<Arc<ClientUseCase<C, PC, P, S>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match client_usecase.get_client(auth.user_id, client_id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn update_client<C, PC, P, S>(
    State(client_usecase): State<Arc<ClientUseCase<C, PC, P, S>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
    Json(update_client_model): Json<UpdateClientModel>,
) -> impl IntoResponse
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match client_usecase
        .update_client(auth.user_id, client_id, update_client_model)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn archive_client<C, PC, P, S>(
    State(client_usecase): State<Arc<ClientUseCase<C, PC, P, S>>>,
    auth: AuthUser,
    Path(client_id): Path<Uuid>,
) -> impl IntoResponse
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match client_usecase.archive_client(auth.user_id, client_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
