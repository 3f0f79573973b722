use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use agent_studio::config::{ServerConfig, WizardConfig};
use agent_studio::store::{AgentStore, LibSqlAgentStore, MockAgentStore};
use agent_studio::wizard::{MemoryDraftStore, WizardRouteState, WizardSessions, wizard_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server = ServerConfig::from_env()?;
    let wizard = WizardConfig::from_env()?;

    // stderr always; a daily rolling file when a log dir is configured
    let (file_layer, _log_guard) = match &server.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agent-studio.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    eprintln!("🧙 Agent Studio v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({} max tokens)", wizard.model, wizard.max_tokens);
    eprintln!("   User: {}", wizard.user_id);

    // ── Agent store ──────────────────────────────────────────────────────
    let agents: Arc<dyn AgentStore> = match &server.db_path {
        Some(path) => {
            let store = LibSqlAgentStore::new_local(path)
                .await
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            eprintln!("   Database: {}", path.display());
            Arc::new(store)
        }
        None => {
            eprintln!(
                "   Database: mock ({}ms simulated latency)",
                server.mock_latency.as_millis()
            );
            Arc::new(MockAgentStore::with_latency(server.mock_latency))
        }
    };

    let state = WizardRouteState {
        default_user_id: wizard.user_id.clone(),
        sessions: Arc::new(WizardSessions::new(
            wizard,
            agents,
            Arc::new(MemoryDraftStore::new()),
        )),
    };

    let app = wizard_routes(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port))
        .await
        .with_context(|| format!("failed to bind port {}", server.port))?;
    eprintln!("   API: http://0.0.0.0:{}/api/wizard", server.port);
    tracing::info!(port = server.port, "Agent Studio server started");

    axum::serve(listener, app).await?;
    Ok(())
}
