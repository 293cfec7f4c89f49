//! Request validation gate.
//!
//! Attached per route with [`validated`]. The gate decodes the path params,
//! the query string and (when the schema has a body part) the JSON body,
//! checks them against a [`RequestSchema`] and either forwards the request
//! untouched or answers `400 {"status": "fail", "message": ...}` itself.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Query, RawPathParams, Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use serde_json::{Map, Value};

use teatrade_core::{RequestInput, RequestSchema};

use crate::app::errors::ApiError;

/// Upper bound on JSON bodies read by the gate.
pub const MAX_JSON_BODY: usize = 1024 * 1024;

const INVALID_JSON: &str = "body must be valid JSON";

/// Put `route` behind the validation gate for `schema`.
///
/// ```ignore
/// .route("/", validated(schemas::create_catalog(), post(create)))
/// ```
pub fn validated<S>(schema: RequestSchema, route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(from_fn_with_state(Arc::new(schema), gate))
}

async fn gate(
    State(schema): State<Arc<RequestSchema>>,
    params: Option<RawPathParams>,
    req: Request,
    next: Next,
) -> Response {
    let params = params_object(params.as_ref());
    let query = query_object(&req);

    let (parts, body) = req.into_parts();
    let (body_value, bytes) = if schema.body.is_some() {
        let decoded = match to_bytes(body, MAX_JSON_BODY).await {
            Ok(bytes) => decode_json(&bytes).map(|value| (value, bytes)),
            Err(_) => None,
        };
        let Some((value, bytes)) = decoded else {
            let input = RequestInput {
                body: &Value::Null,
                query: &query,
                params: &params,
            };
            let failure = schema.reject_body(input, INVALID_JSON);
            tracing::debug!(message = %failure, "request body is not JSON");
            return ApiError::from(failure).into_response();
        };
        (value, Body::from(bytes))
    } else {
        (Value::Null, body)
    };

    let input = RequestInput {
        body: &body_value,
        query: &query,
        params: &params,
    };
    if let Err(failure) = schema.validate(input) {
        tracing::debug!(message = %failure, "request failed validation");
        return ApiError::from(failure).into_response();
    }

    next.run(Request::from_parts(parts, bytes)).await
}

/// An empty body decodes to `null` so the schema reports it as missing.
fn decode_json(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Value::Null);
    }
    serde_json::from_slice(bytes).ok()
}

fn params_object(params: Option<&RawPathParams>) -> Value {
    let map: Map<String, Value> = params
        .into_iter()
        .flat_map(|p| p.iter())
        .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
        .collect();
    Value::Object(map)
}

fn query_object(req: &Request) -> Value {
    let pairs = Query::<HashMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    Value::Object(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}
