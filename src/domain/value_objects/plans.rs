use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;
use crate::domain::value_objects::entitlements::ConfigFeatures;

/// Fixed UUID representing the free plan every user falls back to.
pub const FREE_PLAN_ID: Uuid = Uuid::nil();

#[derive(Debug, Serialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub price_minor: i32,
    pub features: ConfigFeatures,
}

impl PlanDto {
    pub fn from_entity(entity: PlanEntity, features: ConfigFeatures) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            price_minor: entity.price_minor,
            features,
        }
    }
}
