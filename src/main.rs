use std::sync::Arc;

use resale_price::config::ServiceConfig;
use resale_price::server::{router, AppState};
use resale_price::{ModelBundle, PricePipeline};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::from_env()?;

    // Artifacts must be fully loaded before the listener accepts anything
    let bundle = ModelBundle::load(&cfg.artifacts)?;
    let state = AppState {
        pipeline: Arc::new(PricePipeline::new(bundle)),
        log_features: cfg.log_features,
    };

    let app = router(state);

    tracing::info!("listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
