use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a compact subscriber that writes to stderr only.
///
/// Stdout carries the protocol stream, so nothing else may write to it.
/// An explicit `filter` wins over `RUST_LOG`; the fallback is `info`.
/// ANSI colours are off because stderr is usually a pipe held by a bridge.
pub fn configure_tracing(filter: Option<&str>) -> Result<()> {
    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter '{directives}'"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}
