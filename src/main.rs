//! Engagement Meter - A state-managed HTTP server that measures reader engagement
//!
//! This is the main entry point for the engagement-meter application.

use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use engagement_meter::{
    api::create_router,
    config::Config,
    services::TracingSink,
    state::AppState,
    tasks::page_view_reaper_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("engagement_meter={},tower_http=info", config.log_level()))
        .init();

    info!("Starting engagement-meter server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, wpm={}, milestones={}%/{}%",
        config.host, config.port, config.words_per_minute, config.medium_milestone, config.full_milestone
    );

    let settings = config.tracker_settings()?;

    // Create application state
    let state = Arc::new(AppState::new(
        settings,
        Arc::new(TracingSink),
        config.port,
        config.host.clone(),
    ));

    // Start the idle page view reaper
    let reaper_state = Arc::clone(&state);
    tokio::spawn(async move {
        page_view_reaper_task(reaper_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /pageviews            - Register a page view");
    info!("  POST   /pageviews/:id/scroll - Report a scroll measurement");
    info!("  GET    /pageviews/:id        - Inspect engagement flags");
    info!("  DELETE /pageviews/:id        - Stop tracking a page view");
    info!("  GET    /config               - Selectors and milestones");
    info!("  GET    /status               - Server status");
    info!("  GET    /health               - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app).into_future();

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    let closed = state.close_all()?;
    info!("Closed {} page view(s)", closed);
    info!("Server shutdown complete");
    Ok(())
}
