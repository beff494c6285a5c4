use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    ads::{
        dto::{AdResponse, CreateAdRequest, ListAdsQuery, ListAdsResponse},
        services::NewAd,
    },
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::AppError,
    state::AppState,
};

pub fn ads_routes() -> Router<AppState> {
    Router::new()
        .route("/ads", get(list_ads).post(create_ad))
        .route("/ads/:id", get(get_ad))
}

#[instrument(skip(state, body))]
pub async fn create_ad(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateAdRequest>,
) -> Result<(StatusCode, Json<AdResponse>), AppError> {
    let ad = state
        .ads
        .create_ad(
            user_id,
            NewAd {
                title: &body.title,
                description: &body.description,
                image_url: &body.image_url,
                price: body.price,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(AdResponse::new(ad, Some(user_id)))))
}

#[instrument(skip(state))]
pub async fn list_ads(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(q): Query<ListAdsQuery>,
) -> Result<Json<ListAdsResponse>, AppError> {
    let page = state.ads.list_ads(q.into()).await?;
    Ok(Json(ListAdsResponse::new(page, viewer)))
}

#[instrument(skip(state))]
pub async fn get_ad(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdResponse>, AppError> {
    let ad = state.ads.get_ad(id).await?;
    Ok(Json(AdResponse::new(ad, viewer)))
}
