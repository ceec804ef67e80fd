use roster_api::users::MemoryUserStore;
use roster_api::{build_app, AppConfig};
use roster_kit::RouterExt;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        environment = %config.server.environment,
        prefix = %config.api_prefix(),
        "starting roster"
    );

    build_app(&config, Arc::new(MemoryUserStore::new()))?
        .serve(&config)
        .await?;

    Ok(())
}
