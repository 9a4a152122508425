use std::sync::Arc;

use anyhow::Context;
use keygate_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    keygate_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = app::services::build_services(&config).await?;

    if let Some(admin) = &config.bootstrap_admin {
        services
            .bootstrap_admin(admin)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin failed: {e}"))?;
    }

    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
