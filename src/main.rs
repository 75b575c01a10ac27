mod api;
mod config;
mod error;
mod executor;
mod languages;
mod runner;
mod workspace;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::executor::Executor;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("snippet_runner=info".parse()?),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = config.bind_addr()?;

    info!("Starting Snippet Runner...");
    info!(
        "Step timeout {}s, toolchain {:?}",
        config.executor.step_timeout.as_secs(),
        config.executor.toolchain
    );
    if let Some(root) = &config.executor.workspace_root {
        info!("Workspaces under {}", root.display());
    }

    let executor = Executor::new(config.executor);
    let app = api::router(executor);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Snippet Runner stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
