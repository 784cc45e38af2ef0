use std::sync::Arc;

use anyhow::Context;
use chrono::{Months, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::InsertSubscriptionEntity,
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        entitlements::ConfigFeatures,
        enums::{
            billing_frequencies::BillingFrequency, subscription_statuses::SubscriptionStatus,
        },
        plans::PlanDto,
        subscriptions::CurrentSubscriptionDto,
    },
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("invalid billing frequency: {0}")]
    InvalidBillingFrequency(String),
    #[error("free plan does not require a subscription")]
    FreePlanSubscription,
    #[error("an active subscription already exists")]
    AlreadySubscribed,
    #[error("no active subscription to cancel")]
    SubscriptionNotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::PlanNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::InvalidBillingFrequency(_)
            | SubscriptionError::FreePlanSubscription => StatusCode::BAD_REQUEST,
            SubscriptionError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscriptionError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

pub struct SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    free_plan_id: Uuid,
}

impl<P, S> SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>, free_plan_id: Uuid) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            free_plan_id,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "subscriptions: failed to list active plans");
            SubscriptionError::Internal(err)
        })?;

        let dtos = plans
            .into_iter()
            .map(|plan| {
                let features = ConfigFeatures::from_value(&plan.features).unwrap_or_else(|err| {
                    warn!(
                        plan_id = %plan.id,
                        parse_error = %err,
                        "subscriptions: malformed plan feature blob"
                    );
                    ConfigFeatures::default()
                });
                PlanDto::from_entity(plan, features)
            })
            .collect();

        Ok(dtos)
    }

    pub async fn get_current_subscription(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Option<CurrentSubscriptionDto>> {
        let subscription = match self
            .subscription_repo
            .find_current_active_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to load current subscription"
                );
                SubscriptionError::Internal(err)
            })? {
            Some(subscription) => subscription,
            None => return Ok(None),
        };

        let plan = self
            .plan_repo
            .find_by_id(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %subscription.plan_id,
                    db_error = ?err,
                    "subscriptions: failed to load subscribed plan"
                );
                SubscriptionError::Internal(err)
            })?;

        let features = ConfigFeatures::from_value(&plan.features).unwrap_or_else(|err| {
            warn!(
                plan_id = %plan.id,
                parse_error = %err,
                "subscriptions: malformed plan feature blob"
            );
            ConfigFeatures::default()
        });

        Ok(Some(CurrentSubscriptionDto {
            plan_id: plan.id,
            plan_name: plan.name,
            status: SubscriptionStatus::from_str(&subscription.status),
            billing_frequency: BillingFrequency::from_str(&subscription.billing_frequency)
                .unwrap_or_default(),
            starts_at: subscription.starts_at,
            ends_at: subscription.ends_at,
            features,
        }))
    }

    pub async fn subscribe(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        billing_frequency: &str,
    ) -> UseCaseResult<Uuid> {
        let billing_frequency = BillingFrequency::from_str(billing_frequency).ok_or_else(|| {
            let err = SubscriptionError::InvalidBillingFrequency(billing_frequency.to_string());
            warn!(
                %user_id,
                %plan_id,
                status = err.status_code().as_u16(),
                "subscriptions: invalid billing frequency"
            );
            err
        })?;

        if plan_id == self.free_plan_id {
            let err = SubscriptionError::FreePlanSubscription;
            warn!(
                %user_id,
                %plan_id,
                status = err.status_code().as_u16(),
                "subscriptions: free plan subscription attempted"
            );
            return Err(err);
        }

        let plan = self
            .plan_repo
            .find_active_plan_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "subscriptions: failed to load plan"
                );
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = SubscriptionError::PlanNotFound;
                warn!(
                    %user_id,
                    %plan_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: plan not found or inactive"
                );
                err
            })?;

        if self
            .subscription_repo
            .find_current_active_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to check existing subscription"
                );
                SubscriptionError::Internal(err)
            })?
            .is_some()
        {
            let err = SubscriptionError::AlreadySubscribed;
            warn!(
                %user_id,
                %plan_id,
                status = err.status_code().as_u16(),
                "subscriptions: user already has an active subscription"
            );
            return Err(err);
        }

        let starts_at = Utc::now();
        let ends_at = starts_at
            .checked_add_months(Months::new(billing_frequency.months()))
            .context("failed to compute subscription end date")?;

        let subscription_id = self
            .subscription_repo
            .insert_subscription(InsertSubscriptionEntity {
                user_id,
                plan_id: plan.id,
                status: SubscriptionStatus::Active.to_string(),
                billing_frequency: billing_frequency.to_string(),
                starts_at,
                ends_at,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "subscriptions: failed to insert subscription"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(
            %user_id,
            %plan_id,
            %subscription_id,
            billing_frequency = %billing_frequency,
            "subscriptions: subscription created"
        );

        Ok(subscription_id)
    }

    pub async fn cancel_subscription(&self, user_id: Uuid) -> UseCaseResult<()> {
        let subscription = self
            .subscription_repo
            .find_current_active_subscription(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "subscriptions: failed to load subscription for cancel"
                );
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = SubscriptionError::SubscriptionNotFound;
                warn!(
                    %user_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: no active subscription to cancel"
                );
                err
            })?;

        self.subscription_repo
            .cancel_subscription(subscription.id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id = %subscription.id,
                    db_error = ?err,
                    "subscriptions: failed to cancel subscription"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(
            %user_id,
            subscription_id = %subscription.id,
            "subscriptions: subscription cancelled"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mockall::predicate::eq;
    use serde_json::json;

    use crate::domain::{
        entities::{plans::PlanEntity, subscriptions::SubscriptionEntity},
        repositories::{plans::MockPlanRepository, subscriptions::MockSubscriptionRepository},
        value_objects::plans::FREE_PLAN_ID,
    };

    fn sample_plan(id: Uuid) -> PlanEntity {
        PlanEntity {
            id,
            name: Some("Pro".to_string()),
            price_minor: 2900,
            features: json!({ "calendar": true, "limits": { "max_clients": 50 } }),
            is_active: true,
        }
    }

    fn sample_subscription(user_id: Uuid, plan_id: Uuid) -> SubscriptionEntity {
        let now = Utc::now();
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            status: SubscriptionStatus::Active.to_string(),
            billing_frequency: BillingFrequency::Monthly.to_string(),
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(29),
            cancelled_at: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn subscribe_creates_yearly_subscription() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        subscription_repo
            .expect_find_current_active_subscription()
            .with(eq(user_id))
            .returning(|_| Box::pin(async { Ok(None) }));

        let subscription_id = Uuid::new_v4();
        subscription_repo
            .expect_insert_subscription()
            .withf(move |entity| {
                entity.plan_id == plan_id
                    && entity.billing_frequency == "yearly"
                    && entity.ends_at > entity.starts_at + Duration::days(360)
            })
            .returning(move |_| Box::pin(async move { Ok(subscription_id) }));

        let usecase = SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        );

        let created = usecase.subscribe(user_id, plan_id, "yearly").await.unwrap();
        assert_eq!(created, subscription_id);
    }

    #[tokio::test]
    async fn subscribe_rejects_free_plan() {
        let plan_repo = MockPlanRepository::new();
        let subscription_repo = MockSubscriptionRepository::new();

        let usecase = SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        );

        let result = usecase
            .subscribe(Uuid::new_v4(), FREE_PLAN_ID, "monthly")
            .await;

        assert!(matches!(
            result,
            Err(SubscriptionError::FreePlanSubscription)
        ));
    }

    #[tokio::test]
    async fn subscribe_rejects_duplicate_active_subscription() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        let plan = sample_plan(plan_id);
        plan_repo
            .expect_find_active_plan_by_id()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let existing = sample_subscription(user_id, plan_id);
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(move |_| {
                let existing = existing.clone();
                Box::pin(async move { Ok(Some(existing)) })
            });

        let usecase = SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        );

        let result = usecase.subscribe(user_id, plan_id, "monthly").await;

        assert!(matches!(result, Err(SubscriptionError::AlreadySubscribed)));
    }

    #[tokio::test]
    async fn cancel_without_active_subscription_is_not_found() {
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        subscription_repo
            .expect_find_current_active_subscription()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        );

        let result = usecase.cancel_subscription(Uuid::new_v4()).await;

        assert!(matches!(
            result,
            Err(SubscriptionError::SubscriptionNotFound)
        ));
    }

    #[tokio::test]
    async fn current_subscription_includes_plan_features() {
        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();

        let subscription = sample_subscription(user_id, plan_id);
        subscription_repo
            .expect_find_current_active_subscription()
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(plan_id);
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(plan) })
        });

        let usecase = SubscriptionUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            FREE_PLAN_ID,
        );

        let current = usecase
            .get_current_subscription(user_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(current.plan_id, plan_id);
        assert_eq!(current.features.limits.get("max_clients"), Some(&50));
    }
}
