use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages, kept in one place so handlers and tests agree.
pub mod msg {
    pub const PRODUCT_NOT_FOUND: &str = "Product not found";
    pub const ORDER_NOT_FOUND: &str = "Order not found";
    pub const ALREADY_PURCHASED: &str = "You have already purchased this product";
    pub const NOT_ENTITLED: &str = "You have not purchased this product";
    pub const NOT_ORDER_OWNER: &str = "Not authorized to view this order";
    pub const ADMIN_REQUIRED: &str = "Admin access required";
    pub const ORDER_TERMINAL: &str = "Order has already failed and cannot be confirmed";
    pub const SIGNATURE_MISMATCH: &str = "Payment verification failed";
    pub const INVALID_WEBHOOK_SIGNATURE: &str = "Invalid webhook signature";
    pub const MISSING_SIGNATURE_HEADER: &str = "Missing x-razorpay-signature header";
    pub const GATEWAY_NOT_CONFIGURED: &str = "Payment gateway not configured";
    pub const GATEWAY_UNAVAILABLE: &str = "Payment gateway unavailable";
    pub const GATEWAY_AMOUNT_MISMATCH: &str = "Payment gateway acknowledged a different amount";
    pub const WEBHOOK_NOT_CONFIGURED: &str = "Webhook secret not configured";
    pub const STORAGE_NOT_CONFIGURED: &str = "Storage not configured";
    pub const STORAGE_UNAVAILABLE: &str = "Storage unavailable";
    pub const LINK_EXPIRED: &str = "Link has expired";
    pub const LINK_INVALID: &str = "Invalid link signature";
    pub const FILE_NOT_FOUND: &str = "File not found";
    pub const PRODUCT_ID_EMPTY: &str = "productId cannot be empty";
    pub const CONFIRMATION_FIELDS_EMPTY: &str =
        "orderId, paymentId and signature are required";
    pub const TITLE_EMPTY: &str = "Title cannot be empty";
    pub const PRICE_NOT_POSITIVE: &str = "Price must be a positive amount";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// External gateway or object store is down or not configured.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Signature verification failed. Treated as a security event.
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, returned as the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) | AppError::Json(_) => "validation_error",
            AppError::Unauthorized => "auth_error",
            AppError::Forbidden(_) => "authorization_error",
            AppError::Conflict(_) => "conflict",
            AppError::UpstreamUnavailable(_) => "upstream_unavailable",
            AppError::Integrity(_) => "integrity_error",
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, Some(msg.clone())),
            AppError::UpstreamUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, Some(msg.clone()))
            }
            AppError::Integrity(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Json(e) => {
                tracing::debug!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, Some("Invalid JSON".to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: kind,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Converts `Option<T>` lookups into `NotFound` errors.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}
