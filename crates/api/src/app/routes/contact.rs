use axum::{Extension, Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use teatrade_infra::run_in_transaction;
use teatrade_infra::store::repo;
use teatrade_trading::{ContactMessage, NewContactMessage};

use crate::app::dto::JsonBody;
use crate::app::errors::ApiError;
use crate::app::state::AppState;
use crate::context::CorrelationId;

/// Public contact form. Rate-limited per client IP.
///
/// The reply carries the request's correlation id as a reference the sender
/// can quote later.
pub async fn submit(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    JsonBody(content): JsonBody<NewContactMessage>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let message = ContactMessage::receive(content, chrono::Utc::now());
    run_in_transaction(state.db(), None, &state.retry, |tx| {
        let message = message.clone();
        Box::pin(async move {
            repo::insert_record(tx, &message).await?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    tracing::info!(contact = %message.id, correlation_id = correlation.as_str(), "contact message received");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Thank you for reaching out. We will get back to you soon.",
            "reference": correlation.as_str(),
        })),
    ))
}
