//! Favorites are scoped to the caller: listing shows only the caller's own,
//! and deleting someone else's is forbidden.

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use teatrade_core::Page;
use teatrade_infra::store::repo;
use teatrade_infra::run_in_transaction;
use teatrade_trading::{Catalog, Favorite, FavoriteTarget, NewFavorite, Stock};

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ApiError;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::context::PrincipalContext;
use crate::middleware::validated;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", validated(schemas::list(), get(list)))
        .route("/", validated(schemas::create_favorite(), post(create)))
        .route("/:id", validated(schemas::by_id(), delete(remove)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<Favorite>>, ApiError> {
    let (mut filter, page) = dto::list_params(&query, &["target_kind"]);
    filter.insert("user_sub", principal.sub());

    let favorites = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_records::<Favorite>(tx, &filter, page).await?) })
    })
    .await?;
    Ok(Json(favorites))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(new): JsonBody<NewFavorite>,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let favorite = Favorite::create(new, &principal.edit_context());
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let favorite = favorite.clone();
        Box::pin(async move {
            let exists = match favorite.target_kind {
                FavoriteTarget::Catalog => repo::get_record::<Catalog>(tx, favorite.target_id).await?.is_some(),
                FavoriteTarget::Stock => repo::get_record::<Stock>(tx, favorite.target_id).await?.is_some(),
            };
            if !exists {
                return Err(ApiError::not_found(favorite.target_kind.as_str()));
            }
            repo::insert_record(tx, &favorite).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let sub = principal.sub().to_owned();
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let sub = sub.clone();
        Box::pin(async move {
            let favorite = repo::get_record::<Favorite>(tx, id)
                .await?
                .ok_or_else(|| ApiError::not_found("favorite"))?;
            favorite.ensure_owner(&sub)?;
            repo::delete_record::<Favorite>(tx, id).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
