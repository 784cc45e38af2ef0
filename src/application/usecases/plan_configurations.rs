use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::plan_configurations::InsertPlanConfigurationEntity,
    repositories::{plan_configurations::PlanConfigurationRepository, plans::PlanRepository},
    value_objects::{
        entitlements::ConfigFeatures,
        plan_configurations::{PlanConfigurationDto, UpsertPlanConfigurationModel},
    },
};

#[derive(Debug, Error)]
pub enum PlanConfigurationError {
    #[error("invalid feature configuration: {0}")]
    InvalidFeatures(String),
    #[error("plan not found")]
    PlanNotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl PlanConfigurationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanConfigurationError::InvalidFeatures(_) => StatusCode::BAD_REQUEST,
            PlanConfigurationError::PlanNotFound => StatusCode::NOT_FOUND,
            PlanConfigurationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlanConfigurationError>;

/// Admin-side management of per-user overrides. The write path is strict:
/// a feature blob that does not match the schema is rejected, unlike the
/// read path which degrades to plan defaults.
pub struct PlanConfigurationUseCase<PC, P>
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    plan_configuration_repo: Arc<PC>,
    plan_repo: Arc<P>,
}

impl<PC, P> PlanConfigurationUseCase<PC, P>
where
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_configuration_repo: Arc<PC>, plan_repo: Arc<P>) -> Self {
        Self {
            plan_configuration_repo,
            plan_repo,
        }
    }

    pub async fn get_active_for_user(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Option<PlanConfigurationDto>> {
        let configuration = match self
            .plan_configuration_repo
            .find_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "plan_configurations: failed to load configuration"
                );
                PlanConfigurationError::Internal(err)
            })? {
            Some(configuration) => configuration,
            None => return Ok(None),
        };

        let features = match ConfigFeatures::from_value(&configuration.features) {
            Ok(features) => features,
            Err(err) => {
                // Stored blob predates schema validation; show it as empty
                // rather than failing the admin view.
                warn!(
                    %user_id,
                    configuration_id = %configuration.id,
                    parse_error = %err,
                    "plan_configurations: malformed stored feature blob"
                );
                ConfigFeatures::default()
            }
        };

        Ok(Some(PlanConfigurationDto::from_entity(
            configuration,
            features,
        )))
    }

    pub async fn upsert(
        &self,
        user_id: Uuid,
        model: UpsertPlanConfigurationModel,
    ) -> UseCaseResult<Uuid> {
        let features = ConfigFeatures::from_value(&model.features).map_err(|err| {
            let err = PlanConfigurationError::InvalidFeatures(err.to_string());
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                error = %err,
                "plan_configurations: rejected malformed feature blob"
            );
            err
        })?;

        if let Some(plan_id) = model.plan_id {
            self.plan_repo
                .find_active_plan_by_id(plan_id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        %plan_id,
                        db_error = ?err,
                        "plan_configurations: failed to load referenced plan"
                    );
                    PlanConfigurationError::Internal(err)
                })?
                .ok_or_else(|| {
                    let err = PlanConfigurationError::PlanNotFound;
                    warn!(
                        %user_id,
                        %plan_id,
                        status = err.status_code().as_u16(),
                        "plan_configurations: referenced plan not found"
                    );
                    err
                })?;
        }

        // Store the validated, normalized form, not the raw submission.
        let normalized = serde_json::to_value(&features)
            .map_err(|err| PlanConfigurationError::Internal(err.into()))?;

        let configuration_id = self
            .plan_configuration_repo
            .upsert_configuration(InsertPlanConfigurationEntity {
                user_id,
                plan_id: model.plan_id,
                features: normalized,
                is_active: model.is_active,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "plan_configurations: failed to upsert configuration"
                );
                PlanConfigurationError::Internal(err)
            })?;

        info!(
            %user_id,
            %configuration_id,
            is_active = model.is_active,
            "plan_configurations: configuration saved"
        );

        Ok(configuration_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    use crate::domain::{
        entities::plans::PlanEntity,
        repositories::{
            plan_configurations::MockPlanConfigurationRepository, plans::MockPlanRepository,
        },
    };

    #[tokio::test]
    async fn upsert_rejects_malformed_features() {
        let plan_config_repo = MockPlanConfigurationRepository::new();
        let plan_repo = MockPlanRepository::new();

        let usecase =
            PlanConfigurationUseCase::new(Arc::new(plan_config_repo), Arc::new(plan_repo));

        let result = usecase
            .upsert(
                Uuid::new_v4(),
                UpsertPlanConfigurationModel {
                    plan_id: None,
                    features: json!({ "calendar": "yes" }),
                    is_active: true,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(PlanConfigurationError::InvalidFeatures(_))
        ));
    }

    #[tokio::test]
    async fn upsert_rejects_unknown_plan() {
        let plan_config_repo = MockPlanConfigurationRepository::new();
        let mut plan_repo = MockPlanRepository::new();

        let plan_id = Uuid::new_v4();
        plan_repo
            .expect_find_active_plan_by_id()
            .with(eq(plan_id))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase =
            PlanConfigurationUseCase::new(Arc::new(plan_config_repo), Arc::new(plan_repo));

        let result = usecase
            .upsert(
                Uuid::new_v4(),
                UpsertPlanConfigurationModel {
                    plan_id: Some(plan_id),
                    features: json!({}),
                    is_active: true,
                },
            )
            .await;

        assert!(matches!(result, Err(PlanConfigurationError::PlanNotFound)));
    }

    #[tokio::test]
    async fn upsert_stores_normalized_features() {
        let mut plan_config_repo = MockPlanConfigurationRepository::new();
        let mut plan_repo = MockPlanRepository::new();

        let user_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let configuration_id = Uuid::new_v4();

        plan_repo
            .expect_find_active_plan_by_id()
            .returning(move |id| {
                Box::pin(async move {
                    Ok(Some(PlanEntity {
                        id,
                        name: Some("Pro".to_string()),
                        price_minor: 2900,
                        features: json!({}),
                        is_active: true,
                    }))
                })
            });

        plan_config_repo
            .expect_upsert_configuration()
            .withf(move |entity| {
                // CSV page list must be stored as a normalized array.
                entity.user_id == user_id
                    && entity.features["visiblePages"] == json!(["clients", "jobs"])
            })
            .returning(move |_| Box::pin(async move { Ok(configuration_id) }));

        let usecase =
            PlanConfigurationUseCase::new(Arc::new(plan_config_repo), Arc::new(plan_repo));

        let saved = usecase
            .upsert(
                user_id,
                UpsertPlanConfigurationModel {
                    plan_id: Some(plan_id),
                    features: json!({ "visiblePages": "jobs,clients" }),
                    is_active: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(saved, configuration_id);
    }
}
