use anyhow::Context;

use yamaro_api::{app, config::ServerConfig};
use yamaro_infra::BackendConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    yamaro_observability::init();

    let config = ServerConfig::from_env()?;
    let backend = BackendConfig::from_env()?;

    let services = app::services::build_services(backend);
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind {}", config.addr()))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
