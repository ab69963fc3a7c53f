use std::sync::Arc;

use cats_api::config::AppConfig;
use cats_api::repository::PgStore;
use cats_api::routes;
use cats_api::AppState;
use cats_shared::clients::db::create_pool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cats_shared::middleware::init_tracing("cats-api");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    let store = Arc::new(PgStore::new(pool));
    let metrics_handle = cats_shared::middleware::init_metrics()?;

    let state = Arc::new(AppState::new(config, store, metrics_handle));
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "cats-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
