use std::sync::Arc;

use ferry::server::{
    config::{Config, WorkerMode},
    error::Error,
    router, startup,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = startup::connect_to_valkey(&config).await?;
    let handlers = Arc::new(startup::build_handlers());

    match config.mode {
        WorkerMode::Serve => {
            let state = startup::build_app_state(&config, &pool, handlers);
            let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

            tracing::info!(
                "Starting server on {} ({:?} fallback policy)",
                config.bind_addr,
                config.fallback.policy
            );

            axum::serve(listener, router::routes(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        WorkerMode::Work => {
            let worker_pool = startup::start_worker_pool(&config, &pool, handlers).await?;

            shutdown_signal().await;
            worker_pool.stop().await?;
        }
    }

    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
