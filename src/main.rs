use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shoestore_api::{app_router, config::AppConfig, db, events, handlers::AppServices, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .context("invalid log filter")?,
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(environment = %config.environment, "starting shoestore-api");

    let db = Arc::new(db::connect(&config).await.context("database connection failed")?);
    if config.auto_bootstrap_schema {
        db::bootstrap_schema(&db)
            .await
            .context("schema bootstrap failed")?;
    }

    let (event_sender, event_receiver) = events::channel(1024);
    let _event_task = events::spawn_logging_consumer(event_receiver);

    let services = AppServices::new(db.clone(), event_sender.clone());
    let state = AppState {
        db,
        config: config.clone(),
        event_sender,
        services,
    };

    let router = app_router(state);
    let listener = tokio::net::TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr()))?;

    info!(addr = %config.server_addr(), "listening");
    axum::serve(listener, router).await.context("server error")?;

    Ok(())
}
