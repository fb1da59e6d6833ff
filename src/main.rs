use std::{error::Error, net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tracing::{error, info};
use wtr::api::run_web_server;
use wtr::config::{run_options::get_args, Config};
use wtr::db::connection::{ConnectionManager, SqliteConnector};
use wtr::error::AppError;
use wtr::telemetry::ds::AppState;
use wtr::time::RealTimeProvider;
use wtr::utils::start_log;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = get_args();
    let cfg = Config::load(&args)?;
    start_log(&cfg.log.level, None);

    info!("Starting telemetry relay...");

    let connector = SqliteConnector::from_url(cfg.database_url()?)?;
    let store = ConnectionManager::new(connector);
    // Connect before serving so a bad store URL stops the process here.
    if let Err(e) = store.get_handle().await {
        error!(error = ?e, "Store connection failed.");
        return Err(e.into());
    }

    let app_state = AppState::new(store, Arc::new(RealTimeProvider::new()));
    let addr: SocketAddr = cfg
        .web_server
        .address
        .parse()
        .map_err(|e| AppError::Config(format!("invalid web_server.address '{}': {}", cfg.web_server.address, e)))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received.");
        let _ = shutdown_tx.send(true);
    });

    run_web_server(app_state, addr, shutdown_rx).await?;
    info!("Telemetry relay stopped.");
    Ok(())
}
