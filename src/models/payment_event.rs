use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Where a payment confirmation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfirmationChannel {
    /// Relayed by the customer's browser after checkout
    Client,
    /// Pushed by the gateway
    Webhook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfirmationOutcome {
    Paid,
    AlreadyPaid,
    RejectedTerminal,
    SignatureMismatch,
    OrderNotFound,
}

/// Audit row for every processed confirmation. Holds no secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub id: String,
    pub order_id: String,
    pub channel: ConfirmationChannel,
    pub outcome: ConfirmationOutcome,
    pub payment_id: Option<String>,
    pub created_at: i64,
}
