//! Design Market - purchase fulfillment for a digital design storefront
//!
//! Payment intents against a Razorpay-style gateway, signature-verified
//! confirmations from both the browser and webhooks, an idempotent order
//! ledger with entitlements, and time-boxed signed delivery URLs.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod fulfillment;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod rate_limit;
pub mod storage;
pub mod util;
