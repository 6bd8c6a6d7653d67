use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use design_market::config::Config;
use design_market::db::{AppState, create_pool, init_db, queries};
use design_market::handlers;
use design_market::jwt::SessionKeys;
use design_market::models::{CreateProduct, CreateUser, UserRole};
use design_market::payments::Gateway;
use design_market::storage::Storage;

const DEV_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Parser, Debug)]
#[command(name = "design-market")]
#[command(about = "Purchase fulfillment and signed delivery for a digital design storefront")]
struct Cli {
    /// Seed the database with dev data (admin, customer, one product)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

async fn seed_dev_data(state: &AppState) {
    {
        let conn = state.db.get().expect("Failed to get db connection for seeding");
        let count = queries::count_users(&conn).expect("Failed to count users");
        if count > 0 {
            tracing::info!("Database already has data, skipping seed");
            return;
        }
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    // The product file only exists when storage is configured; downloads
    // of the seeded product 503 otherwise.
    let file_key = match &state.storage {
        Storage::Configured(storage) => storage
            .put_object("products", "starter-kit.zip", b"dev starter kit contents")
            .await
            .expect("Failed to store dev product file"),
        Storage::Unconfigured => "products/starter-kit.zip".to_string(),
    };

    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let admin = queries::create_user(
        &conn,
        &CreateUser {
            email: "admin@market.local".to_string(),
            name: "Dev Admin".to_string(),
            password_hash: String::new(),
            role: UserRole::Admin,
        },
    )
    .expect("Failed to create dev admin");

    let customer = queries::create_user(
        &conn,
        &CreateUser {
            email: "customer@market.local".to_string(),
            name: "Dev Customer".to_string(),
            password_hash: String::new(),
            role: UserRole::Customer,
        },
    )
    .expect("Failed to create dev customer");

    let product = queries::create_product(
        &conn,
        &CreateProduct {
            title: "Starter UI Kit".to_string(),
            description: "Buttons, forms and icons".to_string(),
            category: Some("ui-kits".to_string()),
            price: 49900,
            file_key,
            file_name: "starter-kit.zip".to_string(),
            file_size: 24,
            preview_keys: Vec::new(),
        },
    )
    .expect("Failed to create dev product");

    let admin_token = state
        .sessions
        .issue(&admin.id, DEV_TOKEN_LIFETIME)
        .expect("Failed to issue admin token");
    let customer_token = state
        .sessions
        .issue(&customer.id, DEV_TOKEN_LIFETIME)
        .expect("Failed to issue customer token");

    tracing::info!("Admin: {} (id: {})", admin.email, admin.id);
    tracing::info!("Admin token: {}", admin_token);
    tracing::info!("");
    tracing::info!("Customer: {} (id: {})", customer.email, customer.id);
    tracing::info!("Customer token: {}", customer_token);
    tracing::info!("");
    tracing::info!("Product: {} (id: {}, price: {})", product.title, product.id, product.price);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "design_market=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let gateway = Gateway::from_config(config.razorpay.as_ref(), config.gateway_timeout)
        .expect("Failed to build payment gateway client");

    let state = AppState {
        db: db_pool,
        sessions: SessionKeys::new(config.session_secret.as_bytes()),
        gateway,
        storage: Storage::from_config(config.storage.as_ref()),
        currency: config.currency.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set MARKET_ENV=dev)");
        } else {
            seed_dev_data(&state).await;
        }
    }

    let app = Router::new()
        .merge(handlers::router(state.clone(), config.rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Design Market listening on {} (public URL {})", addr, config.base_url);

    // Connect info is required for per-IP rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
