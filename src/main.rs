use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use visaire::config::Config;
use visaire::init;
use visaire::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visaire=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    init::ensure_directories(&config).await?;
    if !init::check_renderer(&config.renderer_command).await {
        warn!(
            "{} not found in PATH; /generate requests will fail at render time",
            config.renderer_command
        );
    }
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set; /generate requests will fail with a configuration error");
    }

    let addr = SocketAddr::new(
        config.host.parse().context("invalid HOST")?,
        config.port,
    );
    let state = AppState::new(config)?;
    let app = server::build_router(state);

    info!("starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
