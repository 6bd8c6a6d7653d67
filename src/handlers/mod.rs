mod files;
mod orders;
mod payment;
mod products;

pub use files::*;
pub use orders::*;
pub use payment::*;
pub use products::*;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::middleware::{require_admin, user_auth};
use crate::rate_limit::{standard_layer, strict_layer};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The full storefront API.
///
/// Rate limiting keys on the peer IP, so the service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router<AppState> {
    // Checkout calls the gateway
    let checkout = Router::new()
        .route("/payment/create-intent", post(create_payment_intent))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth))
        .layer(strict_layer(rate_limit.strict_rpm));

    let customer = Router::new()
        .route("/payment/confirm", post(confirm_payment))
        .route("/products/{id}/download", get(download_product))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth))
        .layer(standard_layer(rate_limit.standard_rpm));

    let account = Router::new()
        .route("/orders/mine", get(my_orders))
        .route("/orders/{id}", get(get_order))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth));

    let admin = Router::new()
        .route("/orders", get(list_orders))
        .route("/admin/stats", get(ledger_stats))
        .layer(middleware::from_fn_with_state(state, require_admin));

    let files = Router::new()
        .route("/files/{*key}", get(serve_file))
        .layer(standard_layer(rate_limit.standard_rpm));

    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        // Authenticated by signature, never rate limited
        .route("/payment/webhook", post(payment_webhook))
        .merge(checkout)
        .merge(customer)
        .merge(account)
        .merge(admin)
        .merge(files)
}
