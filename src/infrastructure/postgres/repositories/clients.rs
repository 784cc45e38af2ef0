use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    entities::clients::{ClientEntity, InsertClientEntity, UpdateClientEntity},
    repositories::clients::ClientRepository,
};
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::clients};

pub struct ClientPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ClientPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ClientRepository for ClientPostgres {
    async fn count_active_for_user(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = clients::table
            .filter(clients::user_id.eq(user_id))
            .filter(clients::is_archived.eq(false))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn insert(&self, insert_client_entity: InsertClientEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(clients::table)
            .values(&insert_client_entity)
            .returning(clients::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(result)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = clients::table
            .filter(clients::user_id.eq(user_id))
            .filter(clients::is_archived.eq(false))
            .order(clients::name.asc())
            .select(ClientEntity::as_select())
            .load::<ClientEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_for_user(
        &self,
        client_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ClientEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = clients::table
            .filter(clients::id.eq(client_id))
            .filter(clients::user_id.eq(user_id))
            .select(ClientEntity::as_select())
            .first::<ClientEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update(
        &self,
        client_id: Uuid,
        user_id: Uuid,
        changes: UpdateClientEntity,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let changes = UpdateClientEntity {
            updated_at: Some(Utc::now()),
            ..changes
        };

        let affected = update(clients::table)
            .filter(clients::id.eq(client_id))
            .filter(clients::user_id.eq(user_id))
            .set(&changes)
            .execute(&mut conn)?;

        Ok(affected > 0)
    }

    async fn archive(&self, client_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(clients::table)
            .filter(clients::id.eq(client_id))
            .filter(clients::user_id.eq(user_id))
            .filter(clients::is_archived.eq(false))
            .set((
                clients::is_archived.eq(true),
                clients::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(affected > 0)
    }
}
