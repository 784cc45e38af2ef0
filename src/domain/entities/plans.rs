use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::plans;

/// Subscription tier row. `features` holds the plan's default entitlement
/// blob as JSONB; it is validated into a typed schema at the usecase boundary.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: Option<String>,
    pub price_minor: i32,
    pub features: serde_json::Value,
    pub is_active: bool,
}
