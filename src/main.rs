use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use notion_relay::{
    config::Config,
    api::routes::create_router,
    notion::NotionClient,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notion_relay=info,tower_http=info")),
        )
        .init();

    // Configuration must be complete before anything listens
    let config = Config::load().inspect_err(|e| {
        tracing::error!(error = %e, "Refusing to start");
    })?;
    let server_addr = config.server_addr;
    tracing::info!(
        database_id = %config.notion_database_id,
        timeout = ?config.notion_timeout,
        "Starting server on {}",
        server_addr
    );

    let notion = NotionClient::new(&config)?;

    // Create application state
    let app_state = AppState {
        config: Arc::new(config),
        notion: Arc::new(notion),
    };

    // Build the router with routes
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;

    // Start the server
    tracing::info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
