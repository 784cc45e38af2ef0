use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};

use crate::{
    application::usecases::entitlements::EntitlementUseCase,
    domain::{
        repositories::{
            plan_configurations::PlanConfigurationRepository, plans::PlanRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::plans::FREE_PLAN_ID,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::error_response},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                plan_configurations::PlanConfigurationPostgres, plans::PlanPostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_configuration_repository = PlanConfigurationPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let entitlement_usecase = EntitlementUseCase::new(
        Arc::new(plan_configuration_repository),
        Arc::new(plan_repository),
        Arc::new(subscription_repository),
        FREE_PLAN_ID,
    );

    Router::new()
        .route("/", get(get_entitlements))
        .with_state(Arc::new(entitlement_usecase))
}

pub async fn get_entitlements<PC, P, S>(
    State(entitlement_usecase): State<Arc<EntitlementUseCase<PC, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match entitlement_usecase.effective_entitlements(auth.user_id).await {
        Ok(entitlements) => (StatusCode::OK, Json(entitlements)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
