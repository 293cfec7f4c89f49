use std::collections::HashMap;

use axum::async_trait;
use axum::body::to_bytes;
use axum::extract::{FromRequest, Request};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use teatrade_core::PageRequest;
use teatrade_infra::Filter;
use teatrade_trading::{ShipmentStatus, UserRole};

use crate::app::errors::ApiError;
use crate::middleware::validate::MAX_JSON_BODY;

// -------------------------
// Request DTOs
// -------------------------

/// JSON body decoded without looking at `Content-Type`.
///
/// Routes put the validation gate in front of this, so a decode failure here
/// means the body passed the schema but not the record type.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = to_bytes(req.into_body(), MAX_JSON_BODY)
            .await
            .map_err(|_| ApiError::bad_request("body must be valid JSON"))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::bad_request(format!("invalid body: {e}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: ShipmentStatus,
    /// Day the change happened; defaults to today.
    #[serde(default)]
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    pub role: UserRole,
}

// -------------------------
// Query parsing
// -------------------------

/// Pagination plus exact-match filters taken from the query string.
///
/// Only keys listed in `allowed` become filters; anything else is ignored.
pub fn list_params(query: &HashMap<String, String>, allowed: &[&str]) -> (Filter, PageRequest) {
    let page = query.get("page").and_then(|v| v.parse().ok());
    let limit = query.get("limit").and_then(|v| v.parse().ok());

    let mut filter = Filter::new();
    for key in allowed {
        if let Some(value) = query.get(*key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            filter.insert(*key, value);
        }
    }
    (filter, PageRequest::new(page, limit))
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
