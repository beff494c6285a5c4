use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Ad record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ad {
    pub id: Uuid,
    pub user_id: Uuid, // author, not an ownership link
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
