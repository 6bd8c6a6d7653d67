use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::models::{ConfirmationChannel, ConfirmationOutcome, Order, OrderStatus, User};
use crate::payments::{EVENT_PAYMENT_CAPTURED, RazorpayWebhookEvent};

/// Result of applying a verified capture to the ledger.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// This call moved the order to `paid` and granted the entitlement.
    Paid(Order),
    /// Someone else already did; nothing changed.
    AlreadyPaid(Order),
    /// The order had failed; it stays failed.
    RejectedTerminal(Order),
    OrderNotFound,
}

impl CaptureOutcome {
    fn as_event(&self) -> ConfirmationOutcome {
        match self {
            CaptureOutcome::Paid(_) => ConfirmationOutcome::Paid,
            CaptureOutcome::AlreadyPaid(_) => ConfirmationOutcome::AlreadyPaid,
            CaptureOutcome::RejectedTerminal(_) => ConfirmationOutcome::RejectedTerminal,
            CaptureOutcome::OrderNotFound => ConfirmationOutcome::OrderNotFound,
        }
    }
}

/// The one `created -> paid` transition, shared by both confirmation channels.
///
/// Runs in an IMMEDIATE transaction: the status compare-and-swap, the
/// entitlement union and the audit row commit together or not at all. Only
/// the caller whose swap changed the row grants the entitlement, so any
/// number of concurrent or repeated confirmations yield one grant.
pub fn apply_capture(
    conn: &mut Connection,
    order_id: &str,
    payment_id: &str,
    signature: Option<&str>,
    channel: ConfirmationChannel,
) -> Result<CaptureOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let swapped = queries::try_mark_order_paid(&tx, order_id, payment_id, signature)?;
    let outcome = match queries::get_order_by_id(&tx, order_id)? {
        Some(order) if swapped => {
            queries::grant_entitlement(&tx, &order.user_id, &order.product_id)?;
            CaptureOutcome::Paid(order)
        }
        Some(order) => match order.status {
            OrderStatus::Failed => CaptureOutcome::RejectedTerminal(order),
            // `created` cannot be observed here: the swap would have succeeded
            OrderStatus::Paid | OrderStatus::Created => CaptureOutcome::AlreadyPaid(order),
        },
        None => CaptureOutcome::OrderNotFound,
    };

    queries::record_payment_event(&tx, order_id, channel, outcome.as_event(), Some(payment_id))?;
    tx.commit()?;

    Ok(outcome)
}

/// Confirmation relayed by the customer's browser after checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfirmation {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Verify and apply a client-relayed confirmation.
///
/// The signature is checked before anything is read or written. On mismatch
/// a still-`created` order is failed, whoever relayed the confirmation.
pub fn verify_client_confirmation(
    state: &AppState,
    user: &User,
    confirmation: &ClientConfirmation,
) -> Result<Order> {
    let order_id = confirmation.order_id.trim();
    let payment_id = confirmation.payment_id.trim();
    let signature = confirmation.signature.trim();
    if order_id.is_empty() || payment_id.is_empty() || signature.is_empty() {
        return Err(AppError::BadRequest(msg::CONFIRMATION_FIELDS_EMPTY.into()));
    }

    let gateway = state.gateway.configured()?;
    let mut conn = state.db.get()?;

    if !gateway.verify_payment_signature(order_id, payment_id, signature) {
        reject_client_confirmation(&mut conn, user, order_id, payment_id)?;
        return Err(AppError::Integrity(msg::SIGNATURE_MISMATCH.into()));
    }

    match apply_capture(
        &mut conn,
        order_id,
        payment_id,
        Some(signature),
        ConfirmationChannel::Client,
    )? {
        CaptureOutcome::Paid(order) => {
            tracing::info!(
                order_id = %order.id,
                user_id = %order.user_id,
                product_id = %order.product_id,
                channel = "client",
                "Order paid"
            );
            Ok(order)
        }
        CaptureOutcome::AlreadyPaid(order) => {
            tracing::debug!(order_id = %order.id, channel = "client", "Order already paid");
            Ok(order)
        }
        CaptureOutcome::RejectedTerminal(order) => {
            tracing::warn!(order_id = %order.id, channel = "client", "Confirmation for failed order");
            Err(AppError::Conflict(msg::ORDER_TERMINAL.into()))
        }
        CaptureOutcome::OrderNotFound => Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into())),
    }
}

fn reject_client_confirmation(
    conn: &mut Connection,
    user: &User,
    order_id: &str,
    payment_id: &str,
) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let failed = queries::try_mark_order_failed(&tx, order_id)?;
    queries::record_payment_event(
        &tx,
        order_id,
        ConfirmationChannel::Client,
        ConfirmationOutcome::SignatureMismatch,
        Some(payment_id),
    )?;
    tx.commit()?;

    tracing::warn!(
        order_id = %order_id,
        user_id = %user.id,
        channel = "client",
        order_failed = failed,
        "Security event: payment signature mismatch"
    );
    Ok(())
}

/// Verify and apply a gateway webhook.
///
/// `Ok(())` means the delivery was authentic and handled, including events
/// that were ignored. Signature problems are errors and mutate nothing;
/// database errors propagate so the gateway retries.
pub fn process_webhook(state: &AppState, body: &[u8], signature: Option<&str>) -> Result<()> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SIGNATURE_HEADER.into()))?;

    let gateway = state.gateway.configured()?;
    if !gateway.verify_webhook_signature(body, signature)? {
        tracing::warn!(channel = "webhook", "Security event: invalid webhook signature");
        return Err(AppError::Integrity(msg::INVALID_WEBHOOK_SIGNATURE.into()));
    }

    let event: RazorpayWebhookEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignoring unparseable webhook payload: {}", e);
            return Ok(());
        }
    };

    if event.event != EVENT_PAYMENT_CAPTURED {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok(());
    }

    let Some(payment) = event.payload.payment.map(|p| p.entity) else {
        tracing::warn!("payment.captured webhook without payment entity");
        return Ok(());
    };
    let Some(order_id) = payment.order_id.as_deref() else {
        tracing::warn!(payment_id = %payment.id, "Captured payment has no order id");
        return Ok(());
    };

    let mut conn = state.db.get()?;
    match apply_capture(&mut conn, order_id, &payment.id, None, ConfirmationChannel::Webhook)? {
        CaptureOutcome::Paid(order) => tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            product_id = %order.product_id,
            channel = "webhook",
            "Order paid"
        ),
        CaptureOutcome::AlreadyPaid(order) => {
            tracing::debug!(order_id = %order.id, channel = "webhook", "Order already paid")
        }
        CaptureOutcome::RejectedTerminal(order) => tracing::warn!(
            order_id = %order.id,
            payment_id = %payment.id,
            channel = "webhook",
            "Captured payment for failed order, needs manual review"
        ),
        CaptureOutcome::OrderNotFound => tracing::warn!(
            order_id = %order_id,
            payment_id = %payment.id,
            channel = "webhook",
            "Captured payment for unknown order"
        ),
    }

    Ok(())
}
