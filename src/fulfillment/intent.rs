use serde::Serialize;
use uuid::Uuid;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::models::{CreateOrder, User};
use crate::payments::NewGatewayOrder;

/// What the checkout widget needs to open a payment for an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Gateway order id, also the local Order id
    pub intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub gateway_public_key: String,
}

/// Open a purchase of `product_id` for `user`.
///
/// Local checks run before the gateway is contacted. The Order row is written
/// only after the gateway acknowledges, so a gateway failure leaves nothing
/// behind.
pub async fn create_intent(state: &AppState, user: &User, product_id: &str) -> Result<PaymentIntent> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err(AppError::BadRequest(msg::PRODUCT_ID_EMPTY.into()));
    }

    let product = {
        let conn = state.db.get()?;
        let product = queries::get_product_by_id(&conn, product_id)?
            .filter(|p| p.is_active)
            .or_not_found(msg::PRODUCT_NOT_FOUND)?;

        if queries::user_owns_product(&conn, &user.id, &product.id)? {
            return Err(AppError::BadRequest(msg::ALREADY_PURCHASED.into()));
        }
        product
    };

    let gateway = state.gateway.configured()?;

    // Prices are stored in minor units already
    let amount = product.price;
    let gateway_order = gateway
        .orders()
        .create_order(&NewGatewayOrder {
            amount,
            currency: state.currency.clone(),
            receipt: format!("rcpt_{}", Uuid::new_v4().simple()),
        })
        .await?;

    if gateway_order.amount != amount || gateway_order.currency != state.currency {
        tracing::error!(
            gateway_order_id = %gateway_order.id,
            requested = amount,
            acknowledged = gateway_order.amount,
            currency = %gateway_order.currency,
            "Gateway acknowledged a different amount or currency"
        );
        return Err(AppError::UpstreamUnavailable(msg::GATEWAY_AMOUNT_MISMATCH.into()));
    }

    let conn = state.db.get()?;
    let order = queries::create_order(
        &conn,
        &CreateOrder {
            id: gateway_order.id,
            user_id: user.id.clone(),
            product_id: product.id.clone(),
            amount,
            currency: gateway_order.currency,
        },
    )?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.id,
        product_id = %product.id,
        amount,
        "Payment intent created"
    );

    Ok(PaymentIntent {
        intent_id: order.id,
        amount: order.amount,
        currency: order.currency,
        gateway_public_key: gateway.public_key().to_string(),
    })
}
