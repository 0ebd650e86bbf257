use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use mqbroker::{
    logging,
    network::banner::{print_banner, print_startup_log},
    BrokerServer, BrokerState, Settings,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load broker settings")?;
    let listen = settings.listen_addr()?;

    let log_handle = logging::init_logging(settings.to_logging_config())
        .context("Failed to initialize logging")?;

    print_banner(listen, settings.max_connections);

    let result = serve(listen, &settings).await;
    if let Err(e) = &result {
        error!(error = format!("{e:#}"), "Broker stopped with error");
    }

    log_handle.shutdown_async().await;
    result
}

async fn serve(
    listen: SocketAddr,
    settings: &Settings,
) -> Result<()> {
    let state = Arc::new(BrokerState::new());
    let server = BrokerServer::bind(listen, settings.to_connection_config(), state.clone()).await?;

    print_startup_log();
    server.run().await?;

    let stats = state.stats();
    info!(
        topics = stats.topics,
        subscriptions = stats.subscriptions,
        pending_messages = stats.pending_messages,
        "Broker stopped"
    );
    Ok(())
}
