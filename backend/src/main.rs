use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backend::config::AppConfig;
use backend::{create_app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the filter so RUST_LOG can live there too
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::info!("Starting Google sign-in server");
    tracing::debug!("Configuration: {:?}", config);

    let addr = config.bind_addr();
    let state = AppState::new(config).context("Failed to build OAuth client")?;
    let app = create_app(state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
