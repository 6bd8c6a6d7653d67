use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

use super::{GatewayOrder, NewGatewayOrder, OrderApi};

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

/// Razorpay credentials. `key_id` is public and handed to the checkout widget;
/// the two secrets never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    /// Separate secret configured on the Razorpay webhook; None disables webhooks
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Clone)]
pub struct RazorpayClient {
    client: Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(config: &RazorpayConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: RAZORPAY_API_BASE.to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }
}

#[async_trait]
impl OrderApi for RazorpayClient {
    async fn create_order(&self, order: &NewGatewayOrder) -> Result<GatewayOrder> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest {
                amount: order.amount,
                currency: &order.currency,
                receipt: &order.receipt,
                payment_capture: 1,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!("Razorpay order creation timed out");
                } else {
                    tracing::warn!("Razorpay API error: {}", e);
                }
                AppError::UpstreamUnavailable(msg::GATEWAY_UNAVAILABLE.into())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Razorpay rejected order creation ({}): {}", status, error_text);
            return Err(AppError::UpstreamUnavailable(
                msg::GATEWAY_UNAVAILABLE.into(),
            ));
        }

        let created: CreateOrderResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse Razorpay order response: {}", e);
            AppError::UpstreamUnavailable(msg::GATEWAY_UNAVAILABLE.into())
        })?;

        Ok(GatewayOrder {
            id: created.id,
            amount: created.amount,
            currency: created.currency,
        })
    }
}

// ============ Webhook payloads ============

/// Top-level Razorpay webhook envelope.
#[derive(Debug, Deserialize)]
pub struct RazorpayWebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: RazorpayWebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
pub struct RazorpayWebhookPayload {
    pub payment: Option<RazorpayPaymentWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct RazorpayPaymentWrapper {
    pub entity: RazorpayPayment,
}

/// The `payment` entity carried by `payment.*` events.
#[derive(Debug, Deserialize)]
pub struct RazorpayPayment {
    pub id: String,
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

pub const EVENT_PAYMENT_CAPTURED: &str = "payment.captured";
