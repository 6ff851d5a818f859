//! Focus Timer - A Pomodoro-style timer server
//!
//! This is the main entry point for the focus-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use focus_timer::{
    api::create_router,
    config::Config,
    services::Store,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, database={}, interval={}min, break={}s",
        config.host,
        config.port,
        config.database.display(),
        config.default_interval,
        config.break_seconds
    );

    let store = Store::open(&config.database)?;
    let state = Arc::new(AppState::new(store, config.timer_defaults()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /join             - Create an account");
    info!("  POST /login            - Sign in");
    info!("  POST /logout           - Sign out");
    info!("  GET  /timer            - Current timer state");
    info!("  POST /timer/events     - Dispatch READY/WORKING/PAUSED/BREAKING/STOPPED");
    info!("  GET  /sessions         - Recorded work sessions");
    info!("  GET  /profile          - Totals and settings");
    info!("  POST /profile/settings - Update interval and break policy");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

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

    info!("Server shutdown complete");
    Ok(())
}
