use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
}

/// One purchase attempt, keyed by the gateway-issued order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Minor units, snapshotted from the product price at creation
    pub amount: i64,
    pub currency: String,
    pub status: OrderStatus,
    /// Gateway payment id, set on confirmation
    pub payment_id: Option<String>,
    /// Client-relayed confirmation signature, retained for audit
    pub signature: Option<String>,
    pub created_at: i64,
    pub paid_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Order joined with its product title, for order history listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWithProduct {
    #[serde(flatten)]
    pub order: Order,
    pub product_title: String,
}

/// Order with product title and buyer identity, for the admin ledger view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    pub product_title: String,
    pub buyer_name: String,
    pub buyer_email: String,
}

/// Paid revenue in one currency (minor units).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRevenue {
    pub currency: String,
    pub revenue: i64,
}

/// Storefront totals for the admin dashboard. Only `paid` orders count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub total_orders: i64,
    /// Amounts cannot be summed across currencies
    pub revenue_by_currency: Vec<CurrencyRevenue>,
    pub total_customers: i64,
    pub total_products: i64,
}
