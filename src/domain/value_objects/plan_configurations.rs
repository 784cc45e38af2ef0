use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::plan_configurations::PlanConfigurationEntity;
use crate::domain::value_objects::entitlements::ConfigFeatures;

/// Admin-submitted override record. `features` arrives as the raw wire blob
/// and is validated into [`ConfigFeatures`] before it is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPlanConfigurationModel {
    pub plan_id: Option<Uuid>,
    pub features: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct PlanConfigurationDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub features: ConfigFeatures,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl PlanConfigurationDto {
    pub fn from_entity(entity: PlanConfigurationEntity, features: ConfigFeatures) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            plan_id: entity.plan_id,
            features,
            is_active: entity.is_active,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpsertPlanConfigurationResponse {
    pub configuration_id: Uuid,
}
