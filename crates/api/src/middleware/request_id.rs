//! Correlation id handling.
//!
//! Layer order, outermost first:
//! `SetRequestId` (keep the caller's `X-Request-ID` or mint a UUID v4) ->
//! `PropagateRequestId` (echo it on the response) -> trace span ->
//! [`push_correlation_id`] (expose it to handlers).

use axum::extract::Request;
use axum::http::HeaderName;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::RequestId;

use crate::context::CorrelationId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Copy the request id into a [`CorrelationId`] extension for handlers.
pub async fn push_correlation_id(mut req: Request, next: Next) -> Response {
    let id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|rid| rid.header_value().to_str().ok())
        .map(str::to_owned);

    if let Some(id) = id {
        req.extensions_mut().insert(CorrelationId(id));
    }

    next.run(req).await
}
