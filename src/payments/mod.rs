//! Payment gateway integration: order creation and signature verification.

mod razorpay;

pub use razorpay::*;

use std::sync::Arc;

use async_trait::async_trait;

use crate::crypto::verify_hmac_sha256_hex;
use crate::error::{AppError, Result, msg};

/// Parameters for an order on the gateway side.
#[derive(Debug, Clone)]
pub struct NewGatewayOrder {
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    /// Merchant reference shown in the gateway dashboard
    pub receipt: String,
}

/// An order as acknowledged by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// The gateway's order-creation API.
///
/// Implementations must bound every call with a timeout and map transport or
/// upstream failures to `AppError::UpstreamUnavailable`.
#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn create_order(&self, order: &NewGatewayOrder) -> Result<GatewayOrder>;
}

/// A gateway with credentials: an order API plus the secrets used to
/// authenticate confirmations.
pub struct ConfiguredGateway {
    orders: Arc<dyn OrderApi>,
    key_id: String,
    key_secret: String,
    webhook_secret: Option<String>,
}

impl ConfiguredGateway {
    pub fn new(orders: Arc<dyn OrderApi>, config: &RazorpayConfig) -> Self {
        Self {
            orders,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    pub fn orders(&self) -> &dyn OrderApi {
        self.orders.as_ref()
    }

    /// Public key handed to the checkout widget.
    pub fn public_key(&self) -> &str {
        &self.key_id
    }

    /// Check a client-relayed confirmation:
    /// `HMAC-SHA256(key_secret, order_id + "|" + payment_id)`.
    pub fn verify_payment_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let payload = format!("{}|{}", order_id, payment_id);
        verify_hmac_sha256_hex(self.key_secret.as_bytes(), payload.as_bytes(), signature)
    }

    /// Check a webhook signature over the exact bytes received.
    ///
    /// Fails closed with `UpstreamUnavailable` when no webhook secret is configured.
    pub fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> Result<bool> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| AppError::UpstreamUnavailable(msg::WEBHOOK_NOT_CONFIGURED.into()))?;
        Ok(verify_hmac_sha256_hex(secret.as_bytes(), body, signature))
    }
}

/// Payment gateway availability, decided once at startup.
#[derive(Clone)]
pub enum Gateway {
    Configured(Arc<ConfiguredGateway>),
    Unconfigured,
}

impl Gateway {
    /// Build the production gateway from config, or `Unconfigured` if credentials are absent.
    pub fn from_config(config: Option<&RazorpayConfig>, timeout: std::time::Duration) -> Result<Self> {
        match config {
            Some(config) => {
                let client = RazorpayClient::new(config, timeout)?;
                Ok(Gateway::Configured(Arc::new(ConfiguredGateway::new(
                    Arc::new(client),
                    config,
                ))))
            }
            None => Ok(Gateway::Unconfigured),
        }
    }

    /// The configured gateway, or `UpstreamUnavailable`.
    pub fn configured(&self) -> Result<&ConfiguredGateway> {
        match self {
            Gateway::Configured(gateway) => Ok(gateway.as_ref()),
            Gateway::Unconfigured => Err(AppError::UpstreamUnavailable(
                msg::GATEWAY_NOT_CONFIGURED.into(),
            )),
        }
    }
}
