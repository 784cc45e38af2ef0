use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::clients::ClientEntity;

#[derive(Debug, Clone, Deserialize)]
pub struct InsertClientModel {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClientModel {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientDto {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ClientEntity> for ClientDto {
    fn from(value: ClientEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            phone: value.phone,
            address: value.address,
            is_archived: value.is_archived,
            created_at: value.created_at,
        }
    }
}
