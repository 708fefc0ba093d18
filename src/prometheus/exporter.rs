use anyhow::Context;
use anyhow::Result;

use prometheus::Registry;

use prometheus_hyper::Server;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use tokio_util::sync::CancellationToken;

use tracing::error;
use tracing::info;

/// Serves a metrics registry over HTTP until cancelled.
pub struct Exporter {
    bind_address: SocketAddr,
    registry: Registry,
}

impl Exporter {
    pub fn new(bind_address: &str, registry: Registry) -> Result<Self> {
        let bind_address: SocketAddr = bind_address
            .parse()
            .with_context(|| format!("Can't parse prometheus listen address {}", bind_address))?;

        Ok(Exporter {
            bind_address,
            registry,
        })
    }

    async fn run(self, cancel: CancellationToken) {
        info!("Starting prometheus server on {}", self.bind_address);

        let shutdown = async move { cancel.cancelled().await };

        if let Err(e) = Server::run(Arc::new(self.registry), self.bind_address, shutdown).await {
            error!("prometheus server on {} failed: {}", self.bind_address, e);
        }
    }

    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }
}
