use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};

use teatrade_infra::store::{ErrorClass, classify, repo};
use teatrade_infra::{Filter, run_in_transaction};
use teatrade_trading::User;

use crate::app::dto::HealthResponse;
use crate::app::errors::ApiError;
use crate::app::state::AppState;
use crate::context::PrincipalContext;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// The caller's profile, created on first sight and refreshed from the token.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<Value>, ApiError> {
    let user = match sync_user(&state, &principal).await {
        // Two first requests raced to register the same subject; the loser
        // now finds the winner's row.
        Err(ApiError::Store(e)) if classify(&e) == ErrorClass::Conflict => sync_user(&state, &principal).await?,
        other => other?,
    };

    Ok(Json(json!({
        "user": user,
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    })))
}

async fn sync_user(state: &AppState, principal: &PrincipalContext) -> Result<User, ApiError> {
    let sub = principal.sub().to_owned();
    let email = principal.email().map(str::to_owned);
    let name = principal.name().map(str::to_owned);
    let token_admin = principal.is_admin();
    let now = chrono::Utc::now();

    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let sub = sub.clone();
        let email = email.clone();
        let name = name.clone();
        Box::pin(async move {
            let filter = Filter::new().eq("sub", sub.as_str());
            match repo::find_one::<User>(tx, &filter).await? {
                Some(mut user) => {
                    if user.refresh(email, name, token_admin, now) {
                        repo::update_record(tx, &user).await?;
                    }
                    Ok::<_, ApiError>(user)
                }
                None => {
                    let user = User::register(sub, email, name, token_admin, now);
                    repo::insert_record(tx, &user).await?;
                    tracing::info!(user = %user.sub, "user registered");
                    Ok(user)
                }
            }
        })
    })
    .await
}
