mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::jwt::SessionKeys;
use crate::payments::Gateway;
use crate::storage::Storage;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers.
///
/// External clients are constructed once at startup and injected here; their
/// availability is part of the type (`Gateway::Unconfigured`,
/// `Storage::Unconfigured`) rather than a nullable global.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Verifies bearer session tokens
    pub sessions: SessionKeys,
    pub gateway: Gateway,
    pub storage: Storage,
    /// ISO currency code used for new orders
    pub currency: String,
}

/// Create a pool of SQLite connections. Every connection waits on locks instead
/// of failing immediately, so concurrent confirmations serialize on the writer.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
    });
    Pool::builder().max_size(10).build(manager)
}
