use std::sync::Arc;

use rust_random_profile_api::config::Config;
use rust_random_profile_api::handlers::{router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads the immutable configuration, builds one client
/// per upstream API and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_random_profile_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Configuration loaded successfully (country provider: {})",
        config.country_provider
    );

    let port = config.port;
    let app_state = Arc::new(AppState::from_config(config)?);
    tracing::info!("Upstream clients initialized");

    let app = router(app_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
