use std::collections::HashMap;

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
};

use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::{Editable, Stock, write_stock_csv};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::records;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::middleware::validated;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/export", validated(schemas::list(), get(export)))
        .merge(records::upload_route::<Stock>(max_upload_bytes))
        .merge(records::router::<Stock>(schemas::create_stock(), schemas::update_stock()))
}

/// Every stock lot matching the filters as a CSV download.
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let (filter, _) = dto::list_params(&query, Stock::FILTERS);
    let stocks = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_all_records::<Stock>(tx, &filter).await?) })
    })
    .await?;

    let csv = write_stock_csv(&stocks).map_err(|e| ApiError::internal(format!("stock export: {e}")))?;
    tracing::info!(rows = stocks.len(), "stock exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"stock.csv\""),
        ],
        csv,
    ))
}
