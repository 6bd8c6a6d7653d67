//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors
/// instead of panicking on corrupted values.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, password_hash, role, created_at";

pub const PRODUCT_COLS: &str = "id, title, description, category, price, file_key, file_name, file_size, preview_keys, is_active, downloads, created_at, updated_at";

pub const ORDER_COLS: &str =
    "id, user_id, product_id, amount, currency, status, payment_id, signature, created_at, paid_at";

/// Order columns qualified with the `o` alias plus the joined product title.
pub const ORDER_WITH_PRODUCT_COLS: &str = "o.id, o.user_id, o.product_id, o.amount, o.currency, o.status, o.payment_id, o.signature, o.created_at, o.paid_at, p.title";

/// Order with product title and buyer name/email (`o`, `p`, `u` aliases).
pub const ADMIN_ORDER_COLS: &str = "o.id, o.user_id, o.product_id, o.amount, o.currency, o.status, o.payment_id, o.signature, o.created_at, o.paid_at, p.title, u.name, u.email";

pub const PAYMENT_EVENT_COLS: &str = "id, order_id, channel, outcome, payment_id, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let preview_keys: String = row.get(8)?;
        Ok(Product {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            price: row.get(4)?,
            file_key: row.get(5)?,
            file_name: row.get(6)?,
            file_size: row.get(7)?,
            preview_keys: serde_json::from_str(&preview_keys).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            is_active: row.get::<_, i32>(9)? != 0,
            downloads: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            product_id: row.get(2)?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            status: parse_enum(row, 5, "status")?,
            payment_id: row.get(6)?,
            signature: row.get(7)?,
            created_at: row.get(8)?,
            paid_at: row.get(9)?,
        })
    }
}

impl FromRow for OrderWithProduct {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderWithProduct {
            order: Order::from_row(row)?,
            product_title: row.get(10)?,
        })
    }
}

impl FromRow for AdminOrder {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AdminOrder {
            order: Order::from_row(row)?,
            product_title: row.get(10)?,
            buyer_name: row.get(11)?,
            buyer_email: row.get(12)?,
        })
    }
}

impl FromRow for PaymentEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentEvent {
            id: row.get(0)?,
            order_id: row.get(1)?,
            channel: parse_enum(row, 2, "channel")?,
            outcome: parse_enum(row, 3, "outcome")?,
            payment_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}
