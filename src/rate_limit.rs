//! Per-IP rate limiting for storefront endpoints.
//!
//! Tiers:
//! - Strict: /payment/create-intent (calls the payment gateway)
//! - Standard: /payment/confirm, /products/{id}/download, /files/*
//!
//! Webhooks are not limited; the gateway retries on 429 and every delivery
//! is signature-checked anyway.
//!
//! Configure via environment variables:
//! - RATE_LIMIT_STRICT_RPM (default: 10)
//! - RATE_LIMIT_STANDARD_RPM (default: 30)

use std::sync::Arc;
use std::time::Duration;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Creates a rate limiter layer with the specified requests per minute.
/// A zero limit is treated as one request per minute.
fn create_layer(requests_per_minute: u32) -> RateLimitLayer {
    let requests_per_minute = requests_per_minute.max(1);

    let period_secs = 60 / requests_per_minute as u64;
    let mut builder = GovernorConfigBuilder::default();
    builder
        .period(Duration::from_secs(period_secs.max(1)))
        .burst_size(requests_per_minute);

    let config = builder
        .finish()
        .expect("Failed to build rate limiter config");

    GovernorLayer::new(Arc::new(config))
}

/// Endpoints that make external API calls.
pub fn strict_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}

/// Endpoints that do signature checks and database work.
pub fn standard_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}
