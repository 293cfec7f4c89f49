//! Generic CRUD for records with plain create/replace semantics
//! (catalogs, stock lots, selling prices, reports).

use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use teatrade_core::{Page, RequestSchema};
use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::{Editable, FromRow, parse_rows, read_rows};

use crate::app::dto::{self, ImportSummary, JsonBody};
use crate::app::errors::ApiError;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::authz::require_admin;
use crate::context::PrincipalContext;
use crate::middleware::validated;
use crate::upload::Upload;

/// `GET /`, `POST /`, `GET /:id`, `PUT /:id`, `DELETE /:id` (admin) for `R`.
pub fn router<R: Editable>(create_schema: RequestSchema, update_schema: RequestSchema) -> Router<AppState> {
    Router::new()
        .route("/", validated(schemas::list(), get(list::<R>)))
        .route("/", validated(create_schema, post(create::<R>)))
        .route("/:id", validated(schemas::by_id(), get(get_one::<R>)))
        .route("/:id", validated(update_schema, put(update::<R>)))
        .route("/:id", validated(schemas::by_id(), delete(delete_one::<R>)))
}

/// `POST /upload`: bulk import from CSV or Excel.
pub fn upload_route<R>(max_upload_bytes: usize) -> Router<AppState>
where
    R: Editable,
    R::Details: FromRow,
{
    // Multipart bodies carry boundaries and headers on top of the file itself.
    let body_limit = max_upload_bytes + 64 * 1024;
    Router::new().route(
        "/upload",
        validated(
            schemas::upload(),
            post(import::<R>).layer(DefaultBodyLimit::max(body_limit)),
        ),
    )
}

pub async fn list<R: Editable>(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<R>>, ApiError> {
    let (filter, page) = dto::list_params(&query, R::FILTERS);
    let records = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_records::<R>(tx, &filter, page).await?) })
    })
    .await?;
    Ok(Json(records))
}

pub async fn get_one<R: Editable>(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<R>, ApiError> {
    let record = run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move { Ok::<_, ApiError>(repo::get_record::<R>(tx, id).await?) })
    })
    .await?;
    record.map(Json).ok_or_else(|| ApiError::not_found(R::KIND))
}

pub async fn create<R: Editable>(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(details): JsonBody<R::Details>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let record = R::create(details, &principal.edit_context())?;
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let record = record.clone();
        Box::pin(async move {
            repo::insert_record(tx, &record).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(kind = R::KIND, id = %record.id(), user = principal.sub(), "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update<R: Editable>(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
    JsonBody(details): JsonBody<R::Details>,
) -> Result<Json<R>, ApiError> {
    let ctx = principal.edit_context();
    let record = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let details = details.clone();
        let ctx = ctx.clone();
        Box::pin(async move {
            let mut record = repo::get_record::<R>(tx, id)
                .await?
                .ok_or_else(|| ApiError::not_found(R::KIND))?;
            record.revise(details, &ctx)?;
            repo::update_record(tx, &record).await?;
            Ok::<_, ApiError>(record)
        })
    })
    .await?;

    tracing::info!(kind = R::KIND, %id, user = principal.sub(), "record updated");
    Ok(Json(record))
}

pub async fn delete_one<R: Editable>(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&principal)?;
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move {
            repo::delete_record::<R>(tx, id).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(kind = R::KIND, %id, user = principal.sub(), "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Every row is parsed and checked before anything is written; the rows are
/// then inserted in one transaction, so an import lands completely or not at all.
pub async fn import<R>(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    upload: Upload,
) -> Result<(StatusCode, Json<ImportSummary>), ApiError>
where
    R: Editable,
    R::Details: FromRow,
{
    let file = upload.require()?;
    let rows = read_rows(file.format, &file.bytes)?;
    let parsed: Vec<R::Details> = parse_rows(&rows)?;

    let ctx = principal.edit_context();
    let records = parsed
        .into_iter()
        .map(|details| R::create(details, &ctx))
        .collect::<Result<Vec<R>, _>>()?;

    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let records = records.clone();
        Box::pin(async move {
            for record in &records {
                repo::insert_record(tx, record).await?;
            }
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(
        kind = R::KIND,
        imported = records.len(),
        file = file.file_name.as_deref().unwrap_or("-"),
        user = principal.sub(),
        "spreadsheet imported"
    );
    Ok((StatusCode::CREATED, Json(ImportSummary { imported: records.len() })))
}
