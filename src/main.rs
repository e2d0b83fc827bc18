use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::{AppConfig, StoreBackend};
use salonbook::db::SqliteStore;
use salonbook::handlers;
use salonbook::state::AppState;
use salonbook::store::{MemoryStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Sqlite => {
            tracing::info!("using sqlite record store ({})", config.database_url);
            Arc::new(SqliteStore::open(&config.database_url)?)
        }
        StoreBackend::Memory => {
            tracing::info!("using in-memory record store");
            Arc::new(MemoryStore::new())
        }
    };

    if config.admin_token == "changeme" {
        tracing::warn!("ADMIN_TOKEN is not set; using the default token");
    }

    let state = Arc::new(AppState::new(config.clone(), store));

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
