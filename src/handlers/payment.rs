use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::fulfillment::{self, ClientConfirmation, PaymentIntent};
use crate::middleware::UserContext;

const SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub product_id: String,
}

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<PaymentIntent>> {
    let intent = fulfillment::create_intent(&state, &ctx.user, &request.product_id).await?;
    Ok(Json(intent))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub success: bool,
    pub order_id: String,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(confirmation): Json<ClientConfirmation>,
) -> Result<Json<ConfirmResponse>> {
    let order = fulfillment::verify_client_confirmation(&state, &ctx.user, &confirmation)?;
    Ok(Json(ConfirmResponse {
        success: true,
        order_id: order.id,
    }))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Gateway webhook. The body is taken as raw bytes: the signature covers
/// exactly what was sent, so it must be checked before any parsing.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    fulfillment::process_webhook(&state, &body, signature)?;
    Ok(Json(WebhookAck { status: "ok" }))
}
