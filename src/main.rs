//! Countdown Timer - A headless host for countdown timer components
//!
//! This is the main entry point for the countdown-timer application.

use std::sync::Arc;
use tokio::{net::TcpListener, runtime::Handle};
use tracing::info;

use countdown_timer::{
    config::Config,
    countdown::SystemClock,
    state::{AppState, TimerContext},
    api::create_router,
    tasks::{app_lifecycle_task, TokioTickSource},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-timer host v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={:?}",
          config.host, config.port, config.tick_interval());

    // One tick source shared by every mounted timer
    let context = TimerContext::new(
        TokioTickSource::new(Handle::current()),
        SystemClock,
        config.tick_interval(),
    );

    // Forward SIGUSR1/SIGUSR2 as background/foreground transitions
    let lifecycle_context = context.clone();
    tokio::spawn(async move {
        app_lifecycle_task(lifecycle_context).await;
    });

    let state = Arc::new(AppState::new(context.clone(), config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /timers                  - Mount a timer");
    info!("  GET    /timers                  - List timers and scheduler status");
    info!("  GET    /timers/:id              - Timer snapshot");
    info!("  PATCH  /timers/:id              - Update timer props");
    info!("  DELETE /timers/:id              - Unmount a timer");
    info!("  POST   /timers/:id/start|pause|resume|reset");
    info!("  POST   /timers/:id/add-seconds  - Shift the end time");
    info!("  POST   /timers/:id/end-time     - Set a new end time");
    info!("  POST   /app/background|foreground");
    info!("  GET    /health                  - Health check");

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

    context.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
