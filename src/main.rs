use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use picbundle::config::{AppConfig, EXPIRY_SWEEP_INTERVAL_SECS};
use picbundle::engine::expiry::spawn_expiry_sweeper;
use picbundle::engine::packaging::Packager;
use picbundle::engine::session::SessionStore;
use picbundle::engine::staging::StagingManager;
use picbundle::server::handler::{AppServer, AppState};
use picbundle::source::bing_source::BingSource;

#[tokio::main]
async fn main() -> picbundle::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = AppConfig::from_env();
    std::fs::create_dir_all(&config.archive_dir)?;
    std::fs::create_dir_all(&config.staging_dir)?;

    let store = Arc::new(SessionStore::new());
    let state = AppState {
        store: store.clone(),
        staging: Arc::new(StagingManager::new(
            &config.staging_dir,
            Arc::new(BingSource::new()),
        )),
        packager: Arc::new(Packager::new(&config.archive_dir)),
    };

    if let Some(ttl_secs) = config.session_ttl_secs {
        spawn_expiry_sweeper(
            store,
            Duration::from_secs(ttl_secs),
            Duration::from_secs(EXPIRY_SWEEP_INTERVAL_SECS),
        );
    }

    let addr = format!("{}:{}", config.host, config.port);
    let server = AppServer::bind(&addr, state).await?;
    info!("listening on {} (port {})", addr, server.port());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}
