use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use teatrade_core::Page;
use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::{NewShipment, Shipment, Stock};

use crate::app::dto::{self, JsonBody, StatusChangeRequest};
use crate::app::errors::ApiError;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::context::PrincipalContext;
use crate::middleware::validated;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", validated(schemas::list(), get(list)))
        .route("/", validated(schemas::create_shipment(), post(create)))
        .route("/:id", validated(schemas::by_id(), get(get_one)))
        .route("/:id/status", validated(schemas::shipment_status(), patch(change_status)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<Shipment>>, ApiError> {
    let (filter, page) = dto::list_params(&query, Shipment::FILTERS);
    let shipments = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_records::<Shipment>(tx, &filter, page).await?) })
    })
    .await?;
    Ok(Json(shipments))
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Shipment>, ApiError> {
    let shipment = run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move { Ok::<_, ApiError>(repo::get_record::<Shipment>(tx, id).await?) })
    })
    .await?;
    shipment.map(Json).ok_or_else(|| ApiError::not_found("shipment"))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(new): JsonBody<NewShipment>,
) -> Result<(StatusCode, Json<Shipment>), ApiError> {
    let shipment = Shipment::create(new, &principal.edit_context())?;
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let shipment = shipment.clone();
        Box::pin(async move {
            for (idx, item) in shipment.items.iter().enumerate() {
                if repo::get_record::<Stock>(tx, item.stock_id.into()).await?.is_none() {
                    return Err(ApiError::bad_request(format!(
                        "items[{idx}].stock_id does not match any stock lot"
                    )));
                }
            }
            repo::insert_record(tx, &shipment).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(
        shipment = %shipment.id,
        shipment_no = %shipment.shipment_no,
        packages = shipment.total_packages(),
        user = principal.sub(),
        "shipment created"
    );
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<StatusChangeRequest>,
) -> Result<Json<Shipment>, ApiError> {
    let now = chrono::Utc::now();
    let on = req.on.unwrap_or_else(|| now.date_naive());
    let next = req.status;

    let shipment = run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move {
            let mut shipment = repo::get_record::<Shipment>(tx, id)
                .await?
                .ok_or_else(|| ApiError::not_found("shipment"))?;
            shipment.transition(next, on, now)?;
            repo::update_record(tx, &shipment).await?;
            Ok::<_, ApiError>(shipment)
        })
    })
    .await?;

    tracing::info!(shipment = %id, status = next.as_str(), user = principal.sub(), "shipment status changed");
    Ok(Json(shipment))
}
