use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::{
    entities::plans::PlanEntity,
    repositories::{
        plan_configurations::PlanConfigurationRepository, plans::PlanRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::entitlements::{ConfigFeatures, EntitlementSet},
};

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            EntitlementError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type EntitlementResult<T> = std::result::Result<T, EntitlementError>;

/// Computes a user's effective entitlements: the active subscription's plan
/// (free plan fallback) provides the defaults, and the user's active plan
/// configuration overrides individual keys on top.
///
/// A malformed or missing configuration never fails the read path; it
/// degrades to "no configuration" and the plan defaults apply.
pub struct EntitlementUseCase<PC, P, S>
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_configuration_repo: Arc<PC>,
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    free_plan_id: Uuid,
}

impl<PC, P, S> EntitlementUseCase<PC, P, S>
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(
        plan_configuration_repo: Arc<PC>,
        plan_repo: Arc<P>,
        subscription_repo: Arc<S>,
        free_plan_id: Uuid,
    ) -> Self {
        Self {
            plan_configuration_repo,
            plan_repo,
            subscription_repo,
            free_plan_id,
        }
    }

    /// The plan of the current active subscription, or the free plan.
    pub async fn resolve_effective_plan(&self, user_id: Uuid) -> EntitlementResult<PlanEntity> {
        if let Some(subscription) = self
            .subscription_repo
            .find_current_active_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to load current subscription"
                );
                EntitlementError::Internal(err)
            })?
        {
            match self
                .plan_repo
                .find_active_plan_by_id(subscription.plan_id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        plan_id = %subscription.plan_id,
                        db_error = ?err,
                        "entitlements: failed to load subscribed plan"
                    );
                    EntitlementError::Internal(err)
                })? {
                Some(plan) => {
                    debug!(
                        %user_id,
                        plan_id = %plan.id,
                        "entitlements: using active subscription plan"
                    );
                    return Ok(plan);
                }
                None => {
                    warn!(
                        %user_id,
                        plan_id = %subscription.plan_id,
                        "entitlements: subscribed plan is inactive, falling back to free plan"
                    );
                }
            }
        }

        debug!(%user_id, "entitlements: falling back to free plan");
        self.plan_repo
            .find_by_id(self.free_plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to load free plan"
                );
                EntitlementError::Internal(err)
            })
    }

    pub async fn effective_entitlements(&self, user_id: Uuid) -> EntitlementResult<EntitlementSet> {
        let plan = self.resolve_effective_plan(user_id).await?;

        let defaults = ConfigFeatures::from_value(&plan.features).unwrap_or_else(|err| {
            warn!(
                %user_id,
                plan_id = %plan.id,
                parse_error = %err,
                "entitlements: malformed plan feature blob, using empty defaults"
            );
            ConfigFeatures::default()
        });

        let overrides = self
            .plan_configuration_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlements: failed to load plan configuration"
                );
                EntitlementError::Internal(err)
            })?
            .and_then(|configuration| {
                match ConfigFeatures::from_value(&configuration.features) {
                    Ok(features) => Some(features),
                    Err(err) => {
                        // Degraded mode: treat an unreadable override as no
                        // configuration rather than failing the read path.
                        warn!(
                            %user_id,
                            configuration_id = %configuration.id,
                            parse_error = %err,
                            "entitlements: malformed plan configuration, ignoring override"
                        );
                        None
                    }
                }
            });

        Ok(EntitlementSet::from_layers(
            Some(plan.id),
            &defaults,
            overrides.as_ref(),
        ))
    }
}
