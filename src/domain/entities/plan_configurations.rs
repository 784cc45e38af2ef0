use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::plan_configurations;

/// Per-user override of a plan's entitlements. At most one row per user is
/// active; older rows are kept as history.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plan_configurations)]
pub struct PlanConfigurationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub features: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = plan_configurations)]
pub struct InsertPlanConfigurationEntity {
    pub user_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub features: serde_json::Value,
    pub is_active: bool,
}
