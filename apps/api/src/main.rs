use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;
use tracing_subscriber::EnvFilter;

use paddle_registry_api::api::{router, AppState};
use paddle_registry_api::config::Config;
use paddle_registry_api::infrastructure::repositories::{
    InMemoryStore, PostgresEventDirectory, PostgresRegistrationStore,
};
use paddle_registry_api::services::Stores;

const SCHEMA: &str = include_str!("../migrations/0001_registry.sql");

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let stores = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            pool.execute(SCHEMA)
                .await
                .expect("Failed to apply database schema");
            tracing::info!("Database connected successfully");

            Stores::new(
                Arc::new(PostgresRegistrationStore::new(pool.clone())),
                Arc::new(PostgresEventDirectory::new(pool)),
            )
        }
        None => {
            let store = Arc::new(InMemoryStore::new());
            Stores::new(store.clone(), store)
        }
    };

    let app = router(AppState::new(stores, config.jwt_secret.clone()));

    // Start server
    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
