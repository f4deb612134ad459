// SPDX-License-Identifier: MIT

//! Telecare Portal API server.
//!
//! Fronts the patient and doctor portals with role-based access control
//! and thin data handlers over the hosted auth and data services.

use std::sync::Arc;
use telecare_portal::{config::Config, db::PortalDb, services::IdentityClient, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Telecare Portal API");

    // Outbound clients for the hosted backend
    let identity = IdentityClient::new(&config).expect("Failed to initialize auth client");
    let db = PortalDb::new(&config).expect("Failed to initialize data client");
    tracing::info!(backend = %config.backend_url, "Backend clients initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        identity,
        db,
    });

    // Build router
    let app = telecare_portal::routes::create_router(state);

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

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telecare_portal=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
