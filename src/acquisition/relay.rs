use crate::acquisition::stats::RelayStats;
use crate::configuration::CasterConfig;
use crate::ntrip::CorrectionClient;
use crate::serial::CorrectionSink;

use backoff::ExponentialBackoff;
use backoff::SystemClock;

use std::time::Duration;
use std::time::Instant;

use tokio::io::AsyncWrite;
use tokio::sync::watch;

use tokio_util::sync::CancellationToken;

use tracing::debug;
use tracing::info;
use tracing::warn;

const RATE_REPORT_CHUNKS: u64 = 10;

/// Resources handed back when the relay worker exits.
pub struct RelayOutcome<W> {
    pub sink: CorrectionSink<W>,
    pub client: Option<CorrectionClient>,
    pub stats: RelayStats,
}

/// Sole writer to the receiver, forwarding caster corrections.
pub struct RelayWorker<W> {
    config: CasterConfig,
    client: Option<CorrectionClient>,
    sink: CorrectionSink<W>,
    stats: RelayStats,
    publish: watch::Sender<RelayStats>,
    poll_timeout: Duration,
    idle: Duration,
    backoff: ExponentialBackoff,
    started: Instant,
}

impl<W: AsyncWrite + Unpin> RelayWorker<W> {
    /// `client` is `None` when the first connection attempt failed; the worker keeps trying.
    pub fn new(
        config: CasterConfig,
        client: Option<CorrectionClient>,
        sink: CorrectionSink<W>,
        publish: watch::Sender<RelayStats>,
        poll_timeout: Duration,
        idle: Duration,
    ) -> Self {
        let stats = RelayStats {
            connected: client.is_some(),
            ..RelayStats::default()
        };

        publish.send_replace(stats.clone());

        RelayWorker {
            config,
            client,
            sink,
            stats,
            publish,
            poll_timeout,
            idle,
            backoff: default_backoff(),
            started: Instant::now(),
        }
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn run(mut self, cancel: CancellationToken) -> RelayOutcome<W> {
        debug!("relay worker started for {}", self.config);

        while !cancel.is_cancelled() {
            if self.client.is_none() {
                match reconnect(&self.config, self.backoff.clone(), &cancel).await {
                    Some(c) => {
                        self.client = Some(c);
                        self.stats.connected = true;
                        self.stats.reconnects += 1;
                        self.publish.send_replace(self.stats.clone());
                    }
                    None => break,
                }
            }

            let client = match self.client.as_mut() {
                Some(c) => c,
                None => continue,
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                r = client.read_corrections(self.poll_timeout) => r,
            };

            match result {
                Ok(Some(corrections)) => match self.sink.write_bytes(&corrections).await {
                    Ok(n) => {
                        self.stats.correction_bytes_relayed += n as u64;
                        self.stats.chunks_relayed += 1;
                        self.report_rate();
                    }
                    Err(e) => warn!("unable to write corrections to the receiver: {}", e),
                },
                Ok(None) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.idle) => (),
                    }
                }
                Err(e) => {
                    warn!("correction stream {} failed: {}", self.config, e);

                    client.close().await;
                    self.client = None;
                    self.stats.connected = false;
                }
            }

            self.publish.send_replace(self.stats.clone());
        }

        debug!("relay worker stopped");

        RelayOutcome {
            sink: self.sink,
            client: self.client,
            stats: self.stats,
        }
    }

    fn report_rate(&self) {
        if self.stats.chunks_relayed % RATE_REPORT_CHUNKS != 0 {
            return;
        }

        let seconds = self.started.elapsed().as_secs_f64();

        if seconds > 0.0 {
            debug!(
                "relayed {} correction bytes ({:.1} B/s)",
                self.stats.correction_bytes_relayed,
                self.stats.correction_bytes_relayed as f64 / seconds
            );
        }
    }
}

async fn reconnect(
    config: &CasterConfig,
    policy: ExponentialBackoff,
    cancel: &CancellationToken,
) -> Option<CorrectionClient> {
    let connect = backoff::future::retry(policy, || async move {
        CorrectionClient::connect(config)
            .await
            .map_err(log_error)
            .map_err(backoff::Error::transient)
    });

    tokio::select! {
        _ = cancel.cancelled() => None,
        result = connect => match result {
            Ok(client) => {
                info!("Reconnected to caster {}", config);
                Some(client)
            }
            Err(e) => {
                warn!("giving up on caster {}: {}", config, e);
                None
            }
        },
    }
}

fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(1_000),
        initial_interval: Duration::from_millis(1_000),
        randomization_factor: 0.25,
        multiplier: 1.5,
        max_interval: Duration::from_millis(60_000),
        max_elapsed_time: None,
        clock: SystemClock::default(),
        start_time: Instant::now(),
    }
}

fn log_error<T: std::fmt::Display>(e: T) -> T {
    warn!("caster connection failed: {}", e);

    e
}
