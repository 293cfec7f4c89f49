//! Out-lots: packages released from a stock lot.
//!
//! Creating an out-lot deducts from its lot and deleting one gives the
//! packages back. Both sides change in the same transaction.

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use teatrade_core::Page;
use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::{OutLot, OutLotDetails, Stock};

use crate::app::dto::{self, JsonBody};
use crate::app::errors::ApiError;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::authz::require_admin;
use crate::context::PrincipalContext;
use crate::middleware::validated;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", validated(schemas::list(), get(list)))
        .route("/", validated(schemas::create_out_lot(), post(create)))
        .route("/:id", validated(schemas::by_id(), get(get_one)))
        .route("/:id", validated(schemas::by_id(), delete(remove)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<OutLot>>, ApiError> {
    let (filter, page) = dto::list_params(&query, OutLot::FILTERS);
    let out_lots = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_records::<OutLot>(tx, &filter, page).await?) })
    })
    .await?;
    Ok(Json(out_lots))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OutLot>, ApiError> {
    let out_lot = run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move { Ok::<_, ApiError>(repo::get_record::<OutLot>(tx, id).await?) })
    })
    .await?;
    out_lot.map(Json).ok_or_else(|| ApiError::not_found("out-lot"))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(details): JsonBody<OutLotDetails>,
) -> Result<(StatusCode, Json<OutLot>), ApiError> {
    let ctx = principal.edit_context();
    let out_lot = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let details = details.clone();
        let ctx = ctx.clone();
        Box::pin(async move {
            let mut stock = repo::get_record::<Stock>(tx, details.stock_id.into())
                .await?
                .ok_or_else(|| ApiError::not_found("stock"))?;
            let out_lot = OutLot::release(details, &mut stock, &ctx)?;
            repo::update_record(tx, &stock).await?;
            repo::insert_record(tx, &out_lot).await?;
            Ok::<_, ApiError>(out_lot)
        })
    })
    .await?;

    tracing::info!(
        out_lot = %out_lot.id,
        stock = %out_lot.stock_id,
        packages = out_lot.packages,
        user = principal.sub(),
        "stock released"
    );
    Ok((StatusCode::CREATED, Json(out_lot)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&principal)?;
    let now = chrono::Utc::now();
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move {
            let out_lot = repo::get_record::<OutLot>(tx, id)
                .await?
                .ok_or_else(|| ApiError::not_found("out-lot"))?;

            match repo::get_record::<Stock>(tx, out_lot.stock_id.into()).await? {
                Some(mut stock) => {
                    out_lot.restore_to(&mut stock, now)?;
                    repo::update_record(tx, &stock).await?;
                }
                None => tracing::warn!(stock = %out_lot.stock_id, "stock lot gone, nothing to restore"),
            }

            repo::delete_record::<OutLot>(tx, id).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(out_lot = %id, user = principal.sub(), "out-lot deleted");
    Ok(StatusCode::NO_CONTENT)
}
