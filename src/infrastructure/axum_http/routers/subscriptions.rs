use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::{
    application::usecases::subscriptions::SubscriptionUseCase,
    domain::{
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            plans::FREE_PLAN_ID,
            subscriptions::{SubscribeRequest, SubscribeResponse},
        },
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::error_response},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscription_usecase = SubscriptionUseCase::new(
        Arc::new(plan_repository),
        Arc::new(subscription_repository),
        FREE_PLAN_ID,
    );

    Router::new()
        .route("/plans", get(list_plans))
        .route("/current", get(get_current_subscription))
        .route("/subscribe", post(subscribe))
        .route("/cancel", post(cancel_subscription))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn list_plans<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.list_plans().await {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn get_current_subscription<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.get_current_subscription(auth.user_id).await {
        Ok(Some(subscription)) => (StatusCode::OK, Json(subscription)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No active subscription"),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn subscribe<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    auth: AuthUser,
    Json(subscribe_request): Json<SubscribeRequest>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase
        .subscribe(
            auth.user_id,
            subscribe_request.plan_id,
            &subscribe_request.billing_frequency,
        )
        .await
    {
        Ok(subscription_id) => (
            StatusCode::CREATED,
            Json(SubscribeResponse { subscription_id }),
        )
            .into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn cancel_subscription<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.cancel_subscription(auth.user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
