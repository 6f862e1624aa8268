//! Mise API server
//!
//! Run with: cargo run -p mise-web --bin mise-api

use std::sync::Arc;
use std::time::Duration;

use mise_agent::{tools::DuckDuckGoSearch, Config, CookingWorkflow};
use mise_web::{router::build_router, shutdown::shutdown_signal, state::AppState, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    let _guard = telemetry::init_tracing(config.logging.log_file())?;

    info!("🍳 Mise API starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded. Provider: {:?}, model: {}, research: {}",
        config.llm.provider, config.llm.model, config.research.enabled
    );

    let llm = config.build_backend()?;
    info!("✅ LLM backend ready: {}", llm.model_id());

    let search_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.research.timeout_secs))
        .build()?;
    let search = Arc::new(DuckDuckGoSearch::new(search_client));

    let workflow = CookingWorkflow::new(llm, search, config.toolset(), config.workflow_settings())?;
    info!("✅ Cooking workflow ready");

    let router = build_router(AppState::new(workflow));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("🌐 API listening on http://{}", config.server.bind);
    info!("   Query: POST /cooking/query");
    info!("   Docs:  GET  /docs");
    info!("🍳 Mise ready. Press Ctrl+C to stop.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mise API stopped");
    Ok(())
}
