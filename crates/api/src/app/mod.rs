//! HTTP API application wiring (Axum router + layers).
//!
//! - `state.rs`: shared state (store, retry policy, verifier, limiter)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `schemas.rs`: request schemas checked by the validation gate
//! - `dto.rs`: request/response DTOs and query helpers
//! - `errors.rs`: consistent error responses

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, Method, header},
    middleware::from_fn,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::middleware::{self, request_id};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod schemas;
pub mod state;

use state::AppState;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        let request_id = req
            .headers()
            .get(request_id::REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            user = tracing::field::Empty,
        )
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, request_id::header()])
        .expose_headers([HeaderName::from_static(request_id::REQUEST_ID_HEADER)]);

    Router::new()
        .merge(routes::public(&state))
        .merge(routes::protected(&state))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id::header(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(request_id::header()))
                .layer(trace)
                .layer(cors)
                .layer(from_fn(middleware::push_correlation_id)),
        )
}
