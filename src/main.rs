use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toolcrib::config::AppConfig;
use toolcrib::server::handler::WebServer;
use toolcrib::store::grist::GristClient;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "starting: document={} server={} listen={}",
        config.document, config.server, config.listen
    );

    let store = Arc::new(GristClient::new(
        config.server,
        config.document,
        config.api_key,
    ));

    let server = WebServer::start(store, &config.listen).await?;
    info!("listening on port {}", server.port());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();

    Ok(())
}
