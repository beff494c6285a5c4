use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use crate::ads::query::{AdQuery, DEFAULT_LIMIT, MAX_LIMIT};
use crate::ads::repo_types::Ad;
use crate::error::AppError;
use crate::store::AdStore;

const MAX_TITLE_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Feed request as received from the caller, before normalization.
#[derive(Debug, Clone, Default)]
pub struct ListAdsParams {
    pub page: i64,
    pub limit: i64,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Clone)]
pub struct AdPage {
    pub ads: Vec<Ad>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
}

pub struct NewAd<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
    pub price: f64,
}

fn validate_new_ad(ad: &NewAd<'_>) -> Result<(), AppError> {
    if ad.title.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if ad.title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation("title is too long"));
    }
    if !ad.price.is_finite() || ad.price <= 0.0 {
        return Err(AppError::validation("price must be greater than 0"));
    }
    if ad.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(AppError::validation("description is too long"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AdService {
    ads: Arc<dyn AdStore>,
}

impl AdService {
    pub fn new(ads: Arc<dyn AdStore>) -> Self {
        Self { ads }
    }

    pub async fn create_ad(&self, user_id: Uuid, new_ad: NewAd<'_>) -> Result<Ad, AppError> {
        validate_new_ad(&new_ad)?;

        let ad = Ad {
            id: Uuid::new_v4(),
            user_id,
            title: new_ad.title.to_string(),
            description: new_ad.description.to_string(),
            image_url: new_ad.image_url.to_string(),
            price: new_ad.price,
            created_at: OffsetDateTime::now_utc(),
        };
        self.ads.create_ad(&ad).await.map_err(|e| {
            error!(error = %e, "create_ad failed");
            AppError::from(e)
        })?;

        info!(ad_id = %ad.id, user_id = %user_id, "ad created");
        Ok(ad)
    }

    pub async fn get_ad(&self, id: Uuid) -> Result<Ad, AppError> {
        self.ads
            .get_ad_by_id(id)
            .await
            .map_err(|e| {
                error!(error = %e, ad_id = %id, "get_ad_by_id failed");
                AppError::from(e)
            })?
            .ok_or(AppError::NotFound)
    }

    /// One feed page plus the number of ads matching the same filter.
    pub async fn list_ads(&self, params: ListAdsParams) -> Result<AdPage, AppError> {
        let page = params.page.max(1);
        let limit = if (1..=MAX_LIMIT).contains(&params.limit) {
            params.limit
        } else {
            DEFAULT_LIMIT
        };
        let offset = (page - 1).saturating_mul(limit);

        let query = AdQuery::new(
            offset,
            limit,
            params.sort_by.as_deref(),
            params.sort_order.as_deref(),
            params.min_price,
            params.max_price,
        );

        let ads = self.ads.list_ads(&query).await.map_err(|e| {
            error!(error = %e, "list_ads failed");
            AppError::from(e)
        })?;
        let total_count = self.ads.count_ads(&query.filter).await.map_err(|e| {
            error!(error = %e, "count_ads failed");
            AppError::from(e)
        })?;

        Ok(AdPage {
            ads,
            total_count,
            page,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailingStore, InMemoryAdStore};

    fn new_ad(title: &str, price: f64) -> NewAd<'_> {
        NewAd {
            title,
            description: "",
            image_url: "",
            price,
        }
    }

    async fn seeded(prices: &[f64]) -> (AdService, Uuid) {
        let svc = AdService::new(Arc::new(InMemoryAdStore::default()));
        let user_id = Uuid::new_v4();
        for (i, price) in prices.iter().enumerate() {
            let title = format!("ad #{}", i);
            svc.create_ad(user_id, new_ad(&title, *price)).await.unwrap();
        }
        (svc, user_id)
    }

    fn params(page: i64, limit: i64) -> ListAdsParams {
        ListAdsParams {
            page,
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_ad_validation() {
        let (svc, user_id) = seeded(&[]).await;
        let bad = [
            new_ad("free stuff", 0.0),
            new_ad("negative", -1.0),
            new_ad("nan", f64::NAN),
            new_ad("", 10.0),
        ];
        for ad in bad {
            assert!(matches!(
                svc.create_ad(user_id, ad).await.unwrap_err(),
                AppError::Validation(_)
            ));
        }

        let long_title = "t".repeat(256);
        assert!(matches!(
            svc.create_ad(user_id, new_ad(&long_title, 9.99)).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let long_description = "d".repeat(1001);
        let err = svc
            .create_ad(
                user_id,
                NewAd {
                    title: "ok",
                    description: &long_description,
                    image_url: "",
                    price: 1.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_ad_accepts_limits() {
        let (svc, user_id) = seeded(&[]).await;
        let title = "t".repeat(255);
        let description = "d".repeat(1000);
        let ad = svc
            .create_ad(
                user_id,
                NewAd {
                    title: &title,
                    description: &description,
                    image_url: "not even a url",
                    price: 9.99,
                },
            )
            .await
            .unwrap();
        assert_eq!(ad.user_id, user_id);
        assert_eq!(svc.get_ad(ad.id).await.unwrap().title, title);
    }

    #[tokio::test]
    async fn get_missing_ad_is_not_found() {
        let (svc, _) = seeded(&[]).await;
        assert!(matches!(
            svc.get_ad(Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound
        ));
    }

    #[tokio::test]
    async fn pages_through_fifteen_ads() {
        let prices: Vec<f64> = (1..=15).map(|p| p as f64).collect();
        let (svc, _) = seeded(&prices).await;

        let first = svc.list_ads(params(1, 10)).await.unwrap();
        assert_eq!(first.ads.len(), 10);
        assert_eq!(first.total_count, 15);

        let second = svc.list_ads(params(2, 10)).await.unwrap();
        assert_eq!(second.ads.len(), 5);
        assert_eq!(second.total_count, 15);

        let mut seen: Vec<Uuid> = first.ads.iter().chain(&second.ads).map(|a| a.id).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 15);
    }

    #[tokio::test]
    async fn normalizes_page_and_limit() {
        let prices: Vec<f64> = (1..=15).map(|p| p as f64).collect();
        let (svc, _) = seeded(&prices).await;

        let page = svc.list_ads(params(0, 0)).await.unwrap();
        assert_eq!((page.page, page.limit), (1, 10));
        assert_eq!(page.ads.len(), 10);

        let page = svc.list_ads(params(-3, 101)).await.unwrap();
        assert_eq!((page.page, page.limit), (1, 10));

        let page = svc.list_ads(params(1, 100)).await.unwrap();
        assert_eq!(page.limit, 100);
        assert_eq!(page.ads.len(), 15);
    }

    // An inverted price range drops the upper bound; this pins the current behaviour.
    #[tokio::test]
    async fn inverted_price_range_keeps_only_min() {
        let (svc, _) = seeded(&[10.0, 20.0, 50.0, 75.0, 120.0]).await;
        let page = svc
            .list_ads(ListAdsParams {
                min_price: 50.0,
                max_price: 20.0,
                ..params(1, 10)
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.ads.len(), 3);
        assert!(page.ads.iter().all(|a| a.price >= 50.0));
    }

    #[tokio::test]
    async fn count_ignores_pagination_but_follows_filter() {
        let (svc, _) = seeded(&[5.0, 15.0, 25.0, 35.0, 45.0]).await;
        let page = svc
            .list_ads(ListAdsParams {
                min_price: 10.0,
                max_price: 40.0,
                sort_by: Some("price".into()),
                sort_order: Some("ASC".into()),
                ..params(2, 2)
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        let prices: Vec<f64> = page.ads.iter().map(|a| a.price).collect();
        assert_eq!(prices, vec![35.0]);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let svc = AdService::new(Arc::new(FailingStore));
        assert!(matches!(
            svc.list_ads(params(1, 10)).await.unwrap_err(),
            AppError::Store(_)
        ));
        assert!(matches!(
            svc.create_ad(Uuid::new_v4(), new_ad("ok", 1.0)).await.unwrap_err(),
            AppError::Store(_)
        ));
    }
}
