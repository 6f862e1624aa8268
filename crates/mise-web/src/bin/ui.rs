//! Mise browser UI
//!
//! Run with: cargo run -p mise-web --bin mise-ui

use std::time::Duration;

use mise_agent::Config;
use mise_web::{router::build_ui_router, shutdown::shutdown_signal, state::UiState, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let _guard = telemetry::init_tracing(config.logging.log_file())?;

    info!("🍳 Mise UI starting up...");

    let state = UiState::new(
        config.ui.backend_url.clone(),
        Duration::from_secs(config.ui.request_timeout_secs),
    )?;
    info!("✅ Backend: {}", config.ui.backend_url);

    let router = build_ui_router(state);

    let listener = tokio::net::TcpListener::bind(&config.ui.bind).await?;
    info!("🌐 UI listening on http://{}", config.ui.bind);
    info!("📱 Open your browser and navigate to http://localhost:{}", listener.local_addr()?.port());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mise UI stopped");
    Ok(())
}
