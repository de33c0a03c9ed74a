use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod models;
mod pages;
mod routes;

use config::Config;
use db::Database;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        database = %config.database_path.display(),
        bind_addr = %config.bind_addr,
        "configuration loaded"
    );

    // Fail fast on an unusable database instead of on the first request.
    Database::connect(&config.database_path)?;

    let app = routes::router(AppState {
        db_path: config.database_path,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("todos running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
