use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ads::repo_types::Ad;
use crate::ads::services::{AdPage, ListAdsParams};

#[derive(Debug, Deserialize)]
pub struct CreateAdRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct AdResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_owner: bool,
}

impl AdResponse {
    pub fn new(ad: Ad, viewer: Option<Uuid>) -> Self {
        Self {
            is_owner: viewer == Some(ad.user_id),
            id: ad.id,
            user_id: ad.user_id,
            title: ad.title,
            description: ad.description,
            image_url: ad.image_url,
            price: ad.price,
            created_at: ad.created_at,
        }
    }
}

/// Raw feed query string. Values that fail to parse fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListAdsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn parse_int(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

impl From<ListAdsQuery> for ListAdsParams {
    fn from(q: ListAdsQuery) -> Self {
        Self {
            page: parse_int(q.page.as_deref()),
            limit: parse_int(q.limit.as_deref()),
            min_price: parse_price(q.min_price.as_deref()),
            max_price: parse_price(q.max_price.as_deref()),
            sort_by: q.sort_by,
            sort_order: q.sort_order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListAdsResponse {
    pub ads: Vec<AdResponse>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
}

impl ListAdsResponse {
    pub fn new(page: AdPage, viewer: Option<Uuid>) -> Self {
        Self {
            ads: page
                .ads
                .into_iter()
                .map(|ad| AdResponse::new(ad, viewer))
                .collect(),
            total_count: page.total_count,
            page: page.page,
            limit: page.limit,
        }
    }
}
