use shift_saldo::api::{AppState, create_router};
use shift_saldo::config::{self, database};
use shift_saldo::core::{ChangeFeed, SaldoStore};
use shift_saldo::errors::Result;
use shift_saldo::store::RelationalStore;

use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        bind_address = %app_config.server.bind_address,
        invalid_records = ?app_config.saldo.invalid_records,
        "Configuration loaded"
    );

    // 4. Connect to the database and make sure all tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Start the change feed worker
    let store = Arc::new(RelationalStore::new(db));
    let worker_store = Arc::clone(&store) as Arc<dyn SaldoStore>;
    let (feed, worker) = ChangeFeed::spawn(
        worker_store,
        app_config.saldo.invalid_records,
        app_config.saldo.change_feed_capacity,
    );

    // 6. Serve the API until ctrl-c
    let state = AppState {
        store,
        feed,
        policy: app_config.saldo.invalid_records,
    };
    let listener = tokio::net::TcpListener::bind(&app_config.server.bind_address).await?;
    info!("Listening on {}", app_config.server.bind_address);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last feed sender, so the worker drains its queue and exits
    if let Err(e) = worker.await {
        error!("Change feed worker ended abnormally: {}", e);
    }
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
