use rusqlite::Connection;

/// Initialize the storefront schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (registration/login live outside this service)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'customer' CHECK (role IN ('customer', 'admin')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Products (catalog). file_key / preview_keys are opaque object-store keys.
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT,
            price INTEGER NOT NULL CHECK (price > 0),
            file_key TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_size INTEGER NOT NULL DEFAULT 0,
            preview_keys TEXT NOT NULL DEFAULT '[]',  -- JSON array
            is_active INTEGER NOT NULL DEFAULT 1,
            downloads INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_active ON products(is_active, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);

        -- Entitlements: a set per user, so duplicate grants collapse
        CREATE TABLE IF NOT EXISTS user_entitlements (
            user_id TEXT NOT NULL REFERENCES users(id),
            product_id TEXT NOT NULL REFERENCES products(id),
            granted_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, product_id)
        );

        -- Orders, keyed by the gateway-issued order id.
        -- No uniqueness on (user_id, product_id): concurrent intents may leave
        -- several 'created' rows; only confirmed ones become 'paid'.
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            product_id TEXT NOT NULL REFERENCES products(id),
            amount INTEGER NOT NULL,
            currency TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'created' CHECK (status IN ('created', 'paid', 'failed')),
            payment_id TEXT,
            signature TEXT,
            created_at INTEGER NOT NULL,
            paid_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_orders_product ON orders(product_id);

        -- Confirmation audit trail (one row per processed confirmation)
        CREATE TABLE IF NOT EXISTS payment_events (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL,
            channel TEXT NOT NULL CHECK (channel IN ('client', 'webhook')),
            outcome TEXT NOT NULL,
            payment_id TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payment_events_order ON payment_events(order_id, created_at);
        "#,
    )?;
    Ok(())
}
