use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::entitlements::ConfigFeatures;
use crate::domain::value_objects::enums::{
    billing_frequencies::BillingFrequency, subscription_statuses::SubscriptionStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
    pub billing_frequency: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub subscription_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionDto {
    pub plan_id: Uuid,
    pub plan_name: Option<String>,
    pub status: SubscriptionStatus,
    pub billing_frequency: BillingFrequency,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub features: ConfigFeatures,
}
