use application::UserApp;
use config::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod dto;
mod error;
mod routes;

use routes::AppState;

const DEFAULT_LOG_FILTER: &str =
    "api_server=debug,application=info,domain=info,infrastructure=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("🚀 Starting User Registry API Server");

    // Load configuration from environment
    let config = Config::from_env()?;

    info!("💾 Using database: {}", config.database_url);
    info!("🎂 Minimum user age: {}", config.minimum_age);
    info!("🌐 API server will bind to: {}", config.api_address());

    let user_app = Arc::new(UserApp::from_config(&config)?);
    let app = routes::router(AppState { user_app });

    // Run the server
    let bind_address = config.api_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("🌐 API Server listening on http://{}", bind_address);
    info!("📖 API Documentation:");
    info!("   GET    /users?page&size        - List users");
    info!("   GET    /users/range?from&to    - List users by birth date");
    info!("   GET    /users/:id              - Get user");
    info!("   POST   /users                  - Create user");
    info!("   PUT    /users/:id              - Replace user");
    info!("   PATCH  /users/:id              - Update some fields of a user");
    info!("   DELETE /users/:id              - Delete user");
    info!("   GET    /health                 - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
