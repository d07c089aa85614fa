// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StreamHub accounts API server.

use std::sync::Arc;
use streamhub_accounts::{config::Config, db::Database, services::MediaService, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting StreamHub accounts API");

    // Connect the credential store
    let db = Database::connect(&config).await?;

    // Media host (Cloudinary)
    let media = MediaService::from_config(&config)?;
    tracing::info!(upload_dir = %config.upload_dir.display(), "Media host initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, media));

    // Build router
    let app = streamhub_accounts::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("streamhub_accounts=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
