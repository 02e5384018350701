use std::sync::Arc;

use lead_intake::channels::CliChannel;
use lead_intake::config::{IntakeConfig, RunMode};
use lead_intake::intake::{IntakeEngine, IntakeRouteState, SessionStore, intake_routes, spawn_prune_task};
use lead_intake::llm::create_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = IntakeConfig::from_env()?;

    eprintln!("💬 Lead Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Company: {}", config.company.name);
    eprintln!("   Model: {}", config.model);
    if !config.has_proxy() {
        eprintln!("   No completion proxy configured; replies will be canned.");
    }

    let llm = create_provider(&config)?;
    let engine = Arc::new(IntakeEngine::new(llm, &config));

    if engine.has_remote() {
        if engine.check_connection().await {
            tracing::info!("Completion proxy reachable");
        } else {
            tracing::warn!("Completion proxy check failed; continuing with fallbacks available");
        }
    }

    match config.mode {
        RunMode::Cli => {
            eprintln!("   Type a message and press Enter. /lead shows the lead, /quit to exit.\n");
            let state = CliChannel::new(engine).run().await?;
            tracing::info!(turns = state.turns, step = %state.step, "CLI session ended");
        }
        RunMode::Server => {
            let sessions = SessionStore::new();
            let _prune_handle =
                spawn_prune_task(Arc::clone(&sessions), config.session_idle_timeout);

            let app = intake_routes(IntakeRouteState { engine, sessions });
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
            eprintln!("   Chat API: http://0.0.0.0:{}/api/chat/sessions\n", config.port);
            tracing::info!(port = config.port, "Intake server started");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
