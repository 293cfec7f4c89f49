use std::collections::HashMap;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use teatrade_core::Page;
use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::User;

use crate::app::dto::{self, JsonBody, RoleChangeRequest};
use crate::app::errors::ApiError;
use crate::app::schemas;
use crate::app::state::AppState;
use crate::authz::require_admin;
use crate::context::PrincipalContext;
use crate::middleware::validated;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", validated(schemas::list(), get(list_users)))
        .route("/users/:id/role", validated(schemas::user_role(), patch(set_role)))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Page<User>>, ApiError> {
    require_admin(&principal)?;
    let (filter, page) = dto::list_params(&query, User::FILTERS);
    let users = run_in_transaction(state.db(), None, &state.retry, |tx| {
        let filter = filter.clone();
        Box::pin(async move { Ok::<_, ApiError>(repo::list_records::<User>(tx, &filter, page).await?) })
    })
    .await?;
    Ok(Json(users))
}

pub async fn set_role(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<RoleChangeRequest>,
) -> Result<Json<User>, ApiError> {
    require_admin(&principal)?;
    let now = chrono::Utc::now();
    let role = req.role;

    let user = run_in_transaction(state.db(), None, &state.retry, |tx| {
        Box::pin(async move {
            let mut user = repo::get_record::<User>(tx, id)
                .await?
                .ok_or_else(|| ApiError::not_found("user"))?;
            user.set_role(role, now);
            repo::update_record(tx, &user).await?;
            Ok::<_, ApiError>(user)
        })
    })
    .await?;

    tracing::info!(user = %user.sub, role = ?role, by = principal.sub(), "user role changed");
    Ok(Json(user))
}
