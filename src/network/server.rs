use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{net::TcpListener, select, time::sleep};
use tracing::{debug, error, info, warn};

use super::connection::{ConnectionConfig, ConnectionManager};
use crate::{error::StartupError, BrokerState, Dispatcher};

/// Сколько ждать завершения активных соединений после остановки.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// TCP-акцептор брокера: по задаче tokio на каждое соединение.
pub struct BrokerServer {
    listener: TcpListener,
    manager: Arc<ConnectionManager>,
}

impl BrokerServer {
    /// Открывает слушающий сокет.
    pub async fn bind(
        addr: SocketAddr,
        config: ConnectionConfig,
        state: Arc<BrokerState>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind {
                address: addr,
                source,
            })?;
        let manager = Arc::new(ConnectionManager::new(config, Dispatcher::new(state)));
        Ok(Self { listener, manager })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Принимает соединения до Ctrl-C.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl-C");
        })
        .await
    }

    /// Принимает соединения, пока не завершится `shutdown`.
    pub async fn run_until<F>(
        self,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = self.local_addr()?;
        info!(%local_addr, "Broker listening");

        tokio::pin!(shutdown);
        loop {
            select! {
                _ = &mut shutdown => break,

                accepted = self.listener.accept() => match accepted {
                    Ok((socket, addr)) => {
                        debug!(%addr, "Accepted connection");
                        let manager = self.manager.clone();
                        let tracked = manager.track();
                        tokio::spawn(async move {
                            // Ошибка одного соединения не влияет на остальные.
                            let _ = manager.handle_connection(socket, addr, tracked).await;
                        });
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {e}");
                        sleep(Duration::from_millis(10)).await;
                    }
                },
            }
        }

        info!("Broker stopping, no longer accepting connections");
        drop(self.listener);
        self.manager.shutdown();
        if let Err(e) = self.manager.wait_for_shutdown(SHUTDOWN_GRACE).await {
            warn!("{e}");
        }
        Ok(())
    }
}
