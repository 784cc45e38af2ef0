use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::usecases::entitlements::EntitlementUseCase;
use crate::domain::{
    entities::clients::{InsertClientEntity, UpdateClientEntity},
    repositories::{
        clients::ClientRepository, plan_configurations::PlanConfigurationRepository,
        plans::PlanRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        clients::{ClientDto, InsertClientModel, UpdateClientModel},
        entitlements::limits,
    },
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client name is required")]
    MissingName,
    #[error("client limit reached")]
    LimitReached,
    #[error("client not found")]
    NotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ClientError::MissingName => StatusCode::BAD_REQUEST,
            ClientError::LimitReached => StatusCode::FORBIDDEN,
            ClientError::NotFound => StatusCode::NOT_FOUND,
            ClientError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ClientError>;

pub struct ClientUseCase<C, PC, P, S>
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    client_repo: Arc<C>,
    entitlements: Arc<EntitlementUseCase<PC, P, S>>,
}

impl<C, PC, P, S> ClientUseCase<C, PC, P, S>
where
    C: ClientRepository + Send + Sync + 'static,
    PC: PlanConfigurationRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(client_repo: Arc<C>, entitlements: Arc<EntitlementUseCase<PC, P, S>>) -> Self {
        Self {
            client_repo,
            entitlements,
        }
    }

    pub async fn create_client(
        &self,
        user_id: Uuid,
        model: InsertClientModel,
    ) -> UseCaseResult<Uuid> {
        if model.name.trim().is_empty() {
            let err = ClientError::MissingName;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "clients: rejected client without a name"
            );
            return Err(err);
        }

        self.ensure_client_quota(user_id).await?;

        let client_id = self
            .client_repo
            .insert(InsertClientEntity {
                user_id,
                name: model.name.trim().to_string(),
                email: model.email,
                phone: model.phone,
                address: model.address,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "clients: failed to insert client"
                );
                ClientError::Internal(err)
            })?;

        info!(%user_id, %client_id, "clients: client created");

        Ok(client_id)
    }

    pub async fn list_clients(&self, user_id: Uuid) -> UseCaseResult<Vec<ClientDto>> {
        let clients = self
            .client_repo
            .list_for_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "clients: failed to list clients"
                );
                ClientError::Internal(err)
            })?;

        Ok(clients.into_iter().map(ClientDto::from).collect())
    }

    pub async fn get_client(&self, user_id: Uuid, client_id: Uuid) -> UseCaseResult<ClientDto> {
        let client = self
            .client_repo
            .find_for_user(client_id, user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %client_id,
                    db_error = ?err,
                    "clients: failed to load client"
                );
                ClientError::Internal(err)
            })?
            .ok_or(ClientError::NotFound)?;

        Ok(ClientDto::from(client))
    }

    pub async fn update_client(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        model: UpdateClientModel,
    ) -> UseCaseResult<()> {
        let changes = UpdateClientEntity {
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            updated_at: None,
        };

        let updated = self
            .client_repo
            .update(client_id, user_id, changes)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %client_id,
                    db_error = ?err,
                    "clients: failed to update client"
                );
                ClientError::Internal(err)
            })?;

        if !updated {
            let err = ClientError::NotFound;
            warn!(
                %user_id,
                %client_id,
                status = err.status_code().as_u16(),
                "clients: update target not found"
            );
            return Err(err);
        }

        Ok(())
    }

    pub async fn archive_client(&self, user_id: Uuid, client_id: Uuid) -> UseCaseResult<()> {
        let archived = self
            .client_repo
            .archive(client_id, user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %client_id,
                    db_error = ?err,
                    "clients: failed to archive client"
                );
                ClientError::Internal(err)
            })?;

        if !archived {
            let err = ClientError::NotFound;
            warn!(
                %user_id,
                %client_id,
                status = err.status_code().as_u16(),
                "clients: archive target not found"
            );
            return Err(err);
        }

        info!(%user_id, %client_id, "clients: client archived");

        Ok(())
    }

    async fn ensure_client_quota(&self, user_id: Uuid) -> UseCaseResult<()> {
        let entitlements = self
            .entitlements
            .effective_entitlements(user_id)
            .await
            .map_err(|err| ClientError::Internal(err.into()))?;

        let current_count = self
            .client_repo
            .count_active_for_user(user_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "clients: failed to count clients"
                );
                ClientError::Internal(err)
            })?;

        if !entitlements.allows_one_more(limits::MAX_CLIENTS, current_count) {
            let err = ClientError::LimitReached;
            warn!(
                %user_id,
                current_count,
                limit = entitlements.get_limit(limits::MAX_CLIENTS),
                status = err.status_code().as_u16(),
                "clients: client limit reached"
            );
            return Err(err);
        }

        Ok(())
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
            clients::MockClientRepository, plan_configurations::MockPlanConfigurationRepository,
            plans::MockPlanRepository, subscriptions::MockSubscriptionRepository,
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

    fn insert_model(name: &str) -> InsertClientModel {
        InsertClientModel {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn create_client_enforces_limit() {
        let user_id = Uuid::new_v4();

        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_count_active_for_user()
            .with(eq(user_id))
            .returning(|_| Box::pin(async { Ok(5) }));

        let usecase = ClientUseCase::new(
            Arc::new(client_repo),
            entitlement_usecase(json!({ "limits": { "max_clients": 5 } })),
        );

        let result = usecase.create_client(user_id, insert_model("Acme")).await;

        assert!(matches!(result, Err(ClientError::LimitReached)));
    }

    #[tokio::test]
    async fn create_client_allows_under_limit() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();

        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_count_active_for_user()
            .returning(|_| Box::pin(async { Ok(4) }));
        client_repo
            .expect_insert()
            .withf(|entity| entity.name == "Acme")
            .returning(move |_| Box::pin(async move { Ok(client_id) }));

        let usecase = ClientUseCase::new(
            Arc::new(client_repo),
            entitlement_usecase(json!({ "limits": { "max_clients": 5 } })),
        );

        let created = usecase
            .create_client(user_id, insert_model(" Acme "))
            .await
            .unwrap();

        assert_eq!(created, client_id);
    }

    #[tokio::test]
    async fn absent_limit_means_unlimited_clients() {
        let user_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();

        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_count_active_for_user()
            .returning(|_| Box::pin(async { Ok(10_000) }));
        client_repo
            .expect_insert()
            .returning(move |_| Box::pin(async move { Ok(client_id) }));

        let usecase = ClientUseCase::new(Arc::new(client_repo), entitlement_usecase(json!({})));

        let result = usecase.create_client(user_id, insert_model("Acme")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_client_rejects_blank_name() {
        let client_repo = MockClientRepository::new();

        let usecase = ClientUseCase::new(Arc::new(client_repo), entitlement_usecase(json!({})));

        let result = usecase
            .create_client(Uuid::new_v4(), insert_model("   "))
            .await;

        assert!(matches!(result, Err(ClientError::MissingName)));
    }

    #[tokio::test]
    async fn archive_missing_client_is_not_found() {
        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_archive()
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let usecase = ClientUseCase::new(Arc::new(client_repo), entitlement_usecase(json!({})));

        let result = usecase
            .archive_client(Uuid::new_v4(), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(ClientError::NotFound)));
    }
}
