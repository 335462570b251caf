//! Patient data HTTP gateway.
//!
//! # Environment Variables
//!
//! - `SERVICE_PORT`: Port to listen on (default: 3001)
//! - `MCP_SERVER_COMMAND`: Tool server command line (default: `patientdata-mcp`)
//! - `MCP_TIMEOUT_MS`: Per-call tool server timeout (default: 5000)
//! - `GROQ_API_KEY`: Completion API key; chat is disabled without it
//! - `LOG_FORMAT`: Log format, `json` or `text` (default: json)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `METRICS_ENABLED`: Enable Prometheus metrics (default: true)
//!
//! A `.env` file in the working directory is loaded first if present.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use patientdata_bridge::BridgeClient;
use patientdata_gateway::{
    init_logging, init_metrics, router, AppState, CompletionOracle, GatewayConfig, LoggingConfig,
    MetricsConfig, OpenAiCompatClient,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let logging_config = LoggingConfig::from_env().with_service("patientdata-gateway");
    init_logging(&logging_config).context("failed to install tracing subscriber")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "failed to load .env file"),
    }

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        warn!(error = %e, "metrics initialization skipped");
    }

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;

    let oracle: Option<Arc<dyn CompletionOracle>> = match config.llm.clone() {
        Some(llm) => {
            let client = OpenAiCompatClient::new(llm).context("failed to build completion client")?;
            info!(model = client.model(), "chat enabled");
            Some(Arc::new(client))
        }
        None => {
            warn!("GROQ_API_KEY not set; /api/chat will report it as not configured");
            None
        }
    };

    info!(
        service = logging_config.service.as_deref().unwrap_or("patientdata-gateway"),
        program = %config.bridge.program_display(),
        timeout_ms = config.bridge.timings.timeout.as_millis() as u64,
        "tool server bridge configured"
    );
    let state = AppState::from_components(Arc::new(BridgeClient::new(config.bridge)), oracle);

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(address = %addr, "starting server");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
