//! HTTP routes, one file per area.
//!
//! Everything except `/health` and `/contact` sits behind the auth middleware.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use teatrade_trading::{Catalog, Report, SellingPrice};

use crate::app::schemas;
use crate::app::state::AppState;
use crate::middleware::{auth_middleware, rate_limit_middleware, validated};

pub mod admin;
pub mod contact;
pub mod favorites;
pub mod out_lots;
pub mod records;
pub mod shipments;
pub mod stocks;
pub mod system;

/// Routes that need no token.
pub fn public(state: &AppState) -> Router<AppState> {
    Router::new().route("/health", get(system::health)).route(
        "/contact",
        validated(schemas::contact(), post(contact::submit))
            .layer(from_fn_with_state(state.rate_limit_state(), rate_limit_middleware)),
    )
}

/// Routes that require a valid bearer token.
pub fn protected(state: &AppState) -> Router<AppState> {
    let max_upload = state.settings.uploads.max_bytes;

    Router::new()
        .route("/me", get(system::me))
        .nest(
            "/catalogs",
            records::router::<Catalog>(schemas::create_catalog(), schemas::update_catalog())
                .merge(records::upload_route::<Catalog>(max_upload)),
        )
        .nest("/stocks", stocks::router(max_upload))
        .nest(
            "/selling-prices",
            records::router::<SellingPrice>(schemas::create_price(), schemas::update_price()),
        )
        .nest(
            "/reports",
            records::router::<Report>(schemas::create_report(), schemas::update_report()),
        )
        .nest("/out-lots", out_lots::router())
        .nest("/shipments", shipments::router())
        .nest("/favorites", favorites::router())
        .nest("/admin", admin::router())
        .route_layer(from_fn_with_state(state.auth_state(), auth_middleware))
}
