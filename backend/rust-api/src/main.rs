use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dailytrivia_api::{config::Config, create_router, services::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dailytrivia_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Daily Trivia API");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    // Initialize database connection
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    tracing::info!("MongoDB connected");

    // Build application state (verifies the connection, ensures indexes)
    let app_state = Arc::new(
        AppState::new(config, mongo_client)
            .await
            .context("Failed to initialize application state")?,
    );

    // Seed the word corpus when a list file is configured and the
    // collection is still empty
    dailytrivia_api::services::wordle_service::seed_word_corpus(
        &app_state.config,
        &app_state.mongo,
    )
    .await
    .context("Failed to seed word corpus")?;

    // Build router
    let app = create_router(app_state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&app_state.config.bind_addr)
        .await
        .context("Failed to bind listener")?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
