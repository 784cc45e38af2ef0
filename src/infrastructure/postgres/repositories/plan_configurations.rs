use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{Connection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::plan_configurations::{InsertPlanConfigurationEntity, PlanConfigurationEntity},
    repositories::plan_configurations::PlanConfigurationRepository,
};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::plan_configurations,
};

pub struct PlanConfigurationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanConfigurationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanConfigurationRepository for PlanConfigurationPostgres {
    async fn find_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PlanConfigurationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = plan_configurations::table
            .filter(plan_configurations::user_id.eq(user_id))
            .filter(plan_configurations::is_active.eq(true))
            .order(plan_configurations::updated_at.desc())
            .select(PlanConfigurationEntity::as_select())
            .first::<PlanConfigurationEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn upsert_configuration(
        &self,
        insert_entity: InsertPlanConfigurationEntity,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<Uuid, diesel::result::Error, _>(|conn| {
            if insert_entity.is_active {
                update(plan_configurations::table)
                    .filter(plan_configurations::user_id.eq(insert_entity.user_id))
                    .filter(plan_configurations::is_active.eq(true))
                    .set((
                        plan_configurations::is_active.eq(false),
                        plan_configurations::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
            }

            insert_into(plan_configurations::table)
                .values(&insert_entity)
                .returning(plan_configurations::id)
                .get_result::<Uuid>(conn)
        })?;

        Ok(result)
    }
}
