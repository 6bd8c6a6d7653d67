use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    ADMIN_ORDER_COLS, ORDER_COLS, ORDER_WITH_PRODUCT_COLS, PAYMENT_EVENT_COLS, PRODUCT_COLS, USER_COLS, query_all,
    query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    input.validate()?;

    let id = gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (id, email, name, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &email, &input.name, &input.password_hash, input.role.as_ref(), now],
    )?;

    Ok(User {
        id,
        email,
        name: input.name.clone(),
        password_hash: input.password_hash.clone(),
        role: input.role,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Entitlements ============

/// Product ids the user owns, oldest grant first.
pub fn list_entitlements(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT product_id FROM user_entitlements WHERE user_id = ?1 ORDER BY granted_at, product_id",
    )?;
    let ids = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

pub fn user_owns_product(conn: &Connection, user_id: &str, product_id: &str) -> Result<bool> {
    let owned = conn
        .query_row(
            "SELECT 1 FROM user_entitlements WHERE user_id = ?1 AND product_id = ?2",
            params![user_id, product_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    Ok(owned)
}

/// Add a product to the user's entitlement set. Set-union semantics: granting
/// twice is a no-op. Returns whether a new entitlement was recorded.
pub fn grant_entitlement(conn: &Connection, user_id: &str, product_id: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO user_entitlements (user_id, product_id, granted_at)
         VALUES (?1, ?2, ?3)",
        params![user_id, product_id, now()],
    )?;
    Ok(inserted > 0)
}

// ============ Products ============

pub fn create_product(conn: &Connection, input: &CreateProduct) -> Result<Product> {
    input.validate()?;

    let id = gen_id();
    let now = now();
    let preview_keys = serde_json::to_string(&input.preview_keys)?;

    conn.execute(
        "INSERT INTO products (id, title, description, category, price, file_key, file_name, file_size, preview_keys, is_active, downloads, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, 0, ?10, ?10)",
        params![
            &id,
            &input.title,
            &input.description,
            &input.category,
            input.price,
            &input.file_key,
            &input.file_name,
            input.file_size,
            &preview_keys,
            now,
        ],
    )?;

    Ok(Product {
        id,
        title: input.title.clone(),
        description: input.description.clone(),
        category: input.category.clone(),
        price: input.price,
        file_key: input.file_key.clone(),
        file_name: input.file_name.clone(),
        file_size: input.file_size,
        preview_keys: input.preview_keys.clone(),
        is_active: true,
        downloads: 0,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_product_by_id(conn: &Connection, id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        &[&id],
    )
}

/// Active products, newest first, optionally filtered by category.
pub fn list_active_products(conn: &Connection, category: Option<&str>) -> Result<Vec<Product>> {
    match category {
        Some(category) => query_all(
            conn,
            &format!(
                "SELECT {} FROM products WHERE is_active = 1 AND category = ?1 ORDER BY created_at DESC",
                PRODUCT_COLS
            ),
            &[&category],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM products WHERE is_active = 1 ORDER BY created_at DESC",
                PRODUCT_COLS
            ),
            &[],
        ),
    }
}

pub fn set_product_active(conn: &Connection, id: &str, active: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE products SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active as i32, now(), id],
    )?;
    Ok(affected > 0)
}

/// Increment the download counter in a single statement. Not exactly-once:
/// a retried download counts twice.
pub fn increment_product_downloads(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE products SET downloads = downloads + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(affected > 0)
}

// ============ Orders ============

pub fn create_order(conn: &Connection, input: &CreateOrder) -> Result<Order> {
    let now = now();

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO orders (id, user_id, product_id, amount, currency, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'created', ?6)",
        params![
            &input.id,
            &input.user_id,
            &input.product_id,
            input.amount,
            &input.currency,
            now
        ],
    )?;

    // Gateway order ids are unique; a collision means the gateway misbehaved.
    if inserted == 0 {
        return Err(AppError::Conflict(format!(
            "Order {} already exists",
            input.id
        )));
    }

    Ok(Order {
        id: input.id.clone(),
        user_id: input.user_id.clone(),
        product_id: input.product_id.clone(),
        amount: input.amount,
        currency: input.currency.clone(),
        status: OrderStatus::Created,
        payment_id: None,
        signature: None,
        created_at: now,
        paid_at: None,
    })
}

pub fn get_order_by_id(conn: &Connection, id: &str) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn get_order_with_product(conn: &Connection, id: &str) -> Result<Option<OrderWithProduct>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders o JOIN products p ON p.id = o.product_id WHERE o.id = ?1",
            ORDER_WITH_PRODUCT_COLS
        ),
        &[&id],
    )
}

/// All orders for a user and product, any status, oldest first.
pub fn list_orders_for_user_product(
    conn: &Connection,
    user_id: &str,
    product_id: &str,
) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE user_id = ?1 AND product_id = ?2 ORDER BY created_at, id",
            ORDER_COLS
        ),
        &[&user_id, &product_id],
    )
}

/// The user's completed purchases, newest first.
pub fn list_paid_orders_for_user(conn: &Connection, user_id: &str) -> Result<Vec<OrderWithProduct>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders o JOIN products p ON p.id = o.product_id
             WHERE o.user_id = ?1 AND o.status = 'paid'
             ORDER BY o.created_at DESC",
            ORDER_WITH_PRODUCT_COLS
        ),
        &[&user_id],
    )
}

pub fn list_all_orders(conn: &Connection) -> Result<Vec<AdminOrder>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders o
             JOIN products p ON p.id = o.product_id
             JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC",
            ADMIN_ORDER_COLS
        ),
        &[],
    )
}

/// Dashboard totals. Revenue sums `paid` orders only, per currency.
pub fn ledger_stats(conn: &Connection) -> Result<LedgerStats> {
    let total_orders: i64 = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE status = 'paid'",
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT currency, SUM(amount) FROM orders WHERE status = 'paid'
         GROUP BY currency ORDER BY currency",
    )?;
    let revenue_by_currency = stmt
        .query_map([], |row| {
            Ok(CurrencyRevenue {
                currency: row.get(0)?,
                revenue: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_customers: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'customer'",
        [],
        |row| row.get(0),
    )?;
    let total_products: i64 =
        conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;

    Ok(LedgerStats {
        total_orders,
        revenue_by_currency,
        total_customers,
        total_products,
    })
}

/// Atomically move an order from `created` to `paid`.
///
/// Compare-and-swap on status: of any number of concurrent callers, exactly one
/// sees `Ok(true)`. Everyone else (already paid, failed, or missing) gets `Ok(false)`
/// and must not perform side effects.
pub fn try_mark_order_paid(
    conn: &Connection,
    id: &str,
    payment_id: &str,
    signature: Option<&str>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = 'paid', payment_id = ?1, signature = ?2, paid_at = ?3
         WHERE id = ?4 AND status = 'created'",
        params![payment_id, signature, now(), id],
    )?;
    Ok(affected > 0)
}

/// Atomically move an order from `created` to `failed`. Terminal orders are untouched.
pub fn try_mark_order_failed(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = 'failed' WHERE id = ?1 AND status = 'created'",
        params![id],
    )?;
    Ok(affected > 0)
}

// ============ Payment events ============

pub fn record_payment_event(
    conn: &Connection,
    order_id: &str,
    channel: ConfirmationChannel,
    outcome: ConfirmationOutcome,
    payment_id: Option<&str>,
) -> Result<PaymentEvent> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO payment_events (id, order_id, channel, outcome, payment_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, order_id, channel.as_ref(), outcome.as_ref(), payment_id, now],
    )?;

    Ok(PaymentEvent {
        id,
        order_id: order_id.to_string(),
        channel,
        outcome,
        payment_id: payment_id.map(String::from),
        created_at: now,
    })
}

pub fn list_payment_events_for_order(conn: &Connection, order_id: &str) -> Result<Vec<PaymentEvent>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM payment_events WHERE order_id = ?1 ORDER BY created_at, rowid",
            PAYMENT_EVENT_COLS
        ),
        &[&order_id],
    )
}
