use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::ads::query::{AdFilter, AdQuery};
use crate::ads::repo_types::Ad;
use crate::store::{AdStore, StoreError};

#[derive(Clone)]
pub struct PgAdStore {
    db: PgPool,
}

impl PgAdStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdStore for PgAdStore {
    async fn create_ad(&self, ad: &Ad) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ads (id, user_id, title, description, image_url, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(ad.id)
        .bind(ad.user_id)
        .bind(&ad.title)
        .bind(&ad.description)
        .bind(&ad.image_url)
        .bind(ad.price)
        .bind(ad.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn get_ad_by_id(&self, id: Uuid) -> Result<Option<Ad>, StoreError> {
        let ad = sqlx::query_as::<_, Ad>(
            r#"
            SELECT id, user_id, title, description, image_url, price, created_at
            FROM ads
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(ad)
    }

    async fn list_ads(&self, query: &AdQuery) -> Result<Vec<Ad>, StoreError> {
        let mut qb = query.page_query();
        let rows = qb.build_query_as::<Ad>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn count_ads(&self, filter: &AdFilter) -> Result<i64, StoreError> {
        let mut qb = filter.count_query();
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.db).await?;
        Ok(count)
    }
}
