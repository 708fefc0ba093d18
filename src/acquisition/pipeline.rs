use crate::acquisition::reader::ReadWorker;
use crate::acquisition::reader::ReaderOutcome;
use crate::acquisition::relay::RelayOutcome;
use crate::acquisition::relay::RelayWorker;
use crate::acquisition::stats::AcquisitionStats;
use crate::acquisition::stats::ReaderStats;
use crate::acquisition::stats::RelayStats;
use crate::acquisition::status::notify;
use crate::acquisition::status::StatusReporter;
use crate::acquisition::status::StatusSender;
use crate::acquisition::status::StatusUpdate;
use crate::configuration::CasterConfig;
use crate::configuration::SerialSettings;
use crate::ntrip::CorrectionClient;
use crate::prometheus::Metrics;
use crate::recording::CorrelationLog;
use crate::recording::LogPaths;
use crate::recording::PrimaryLog;
use crate::recording::RecordingError;
use crate::serial::SerialTransport;
use crate::serial::TransportError;
use crate::time_sync::TimeSyncSampler;

use backoff::ExponentialBackoff;

use chrono::Utc;

use std::time::Duration;

use thiserror::Error;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use tokio_util::sync::CancellationToken;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineState {
    Idle,
    Connecting,
    Logging,
    Stopping,
    Stopped { failed: bool },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error("{0} worker did not stop within {1:?}")]
    WorkerTimeout(&'static str, Duration),
    #[error("{0} worker failed: {1}")]
    WorkerFailed(&'static str, JoinError),
}

/// Timing and destinations for one acquisition run.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub paths: LogPaths,
    pub caster: Option<CasterConfig>,
    pub read_timeout: Duration,
    pub read_error_backoff: Duration,
    pub relay_poll_timeout: Duration,
    pub relay_idle: Duration,
    pub status_interval: Duration,
    pub join_timeout: Duration,
}

impl PipelineSettings {
    pub fn new(paths: LogPaths, caster: Option<CasterConfig>) -> Self {
        PipelineSettings {
            paths,
            caster,
            read_timeout: Duration::from_secs(1),
            read_error_backoff: Duration::from_millis(100),
            relay_poll_timeout: Duration::from_secs(1),
            relay_idle: Duration::from_millis(100),
            status_interval: Duration::from_secs(2),
            join_timeout: Duration::from_secs(2),
        }
    }

    /// Poll the receiver with the read timeout configured for its serial port.
    pub fn for_receiver(mut self, serial: &SerialSettings) -> Self {
        self.read_timeout = serial.timeout;
        self
    }
}

/// Runs the read and relay workers over one receiver until cancelled.
pub struct Pipeline {
    settings: PipelineSettings,
    state: watch::Sender<PipelineState>,
    sink: Option<StatusSender>,
    metrics: Option<Metrics>,
    relay_backoff: Option<ExponentialBackoff>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);

        Pipeline {
            settings,
            state,
            sink: None,
            metrics: None,
            relay_backoff: None,
        }
    }

    pub fn with_status_sink(mut self, sink: StatusSender) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_relay_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.relay_backoff = Some(backoff);
        self
    }

    pub fn state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Open the receiver described by `serial` and log until `cancel` fires.
    pub async fn run(
        self,
        serial: &SerialSettings,
        cancel: CancellationToken,
    ) -> Result<AcquisitionStats, PipelineError> {
        self.set_state(PipelineState::Connecting);

        let transport = match SerialTransport::open(serial) {
            Ok(t) => t,
            Err(e) => {
                error!("{}", e);
                self.set_state(PipelineState::Stopped { failed: true });
                return Err(e.into());
            }
        };

        self.log(transport, cancel).await
    }

    /// Log from an already open transport until `cancel` fires.
    pub async fn run_with_transport<T>(
        self,
        transport: SerialTransport<T>,
        cancel: CancellationToken,
    ) -> Result<AcquisitionStats, PipelineError>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.set_state(PipelineState::Connecting);

        self.log(transport, cancel).await
    }

    async fn log<T>(
        self,
        transport: SerialTransport<T>,
        cancel: CancellationToken,
    ) -> Result<AcquisitionStats, PipelineError>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (primary, correlation) = match self.open_logs().await {
            Ok(logs) => logs,
            Err(e) => {
                error!("{}", e);
                self.set_state(PipelineState::Stopped { failed: true });
                return Err(e.into());
            }
        };

        let client = self.connect_caster().await;

        let (source, sink) = transport.split();
        let started = Instant::now();
        let workers = cancel.child_token();

        let (reader_tx, reader_rx) = watch::channel(ReaderStats::default());

        let reader = ReadWorker::new(
            source,
            primary,
            correlation,
            TimeSyncSampler::new(Utc::now()),
            reader_tx,
            self.settings.read_timeout,
            self.settings.read_error_backoff,
        );

        let reader_task = tokio::spawn(reader.run(workers.clone()));

        let (relay_task, relay_rx, unused_sink) = match self.settings.caster.clone() {
            Some(caster) => {
                let (relay_tx, relay_rx) = watch::channel(RelayStats::default());

                let mut relay = RelayWorker::new(
                    caster,
                    client,
                    sink,
                    relay_tx,
                    self.settings.relay_poll_timeout,
                    self.settings.relay_idle,
                );

                if let Some(backoff) = self.relay_backoff.clone() {
                    relay = relay.with_backoff(backoff);
                }

                (Some(tokio::spawn(relay.run(workers.clone()))), Some(relay_rx), None)
            }
            None => (None, None, Some(sink)),
        };

        let status_cancel = CancellationToken::new();
        let reporter = StatusReporter::new(
            reader_rx.clone(),
            relay_rx.clone(),
            started,
            self.settings.status_interval,
        )
        .with_sink(self.sink.clone())
        .with_metrics(self.metrics.clone());

        let status_task = tokio::spawn(reporter.run(status_cancel.clone()));

        self.set_state(PipelineState::Logging);

        cancel.cancelled().await;

        self.set_state(PipelineState::Stopping);
        workers.cancel();

        let join_timeout = self.settings.join_timeout;

        let (reader_result, relay_result) = tokio::join!(
            join("read", reader_task, join_timeout),
            async move {
                match relay_task {
                    Some(task) => Some(join("relay", task, join_timeout).await),
                    None => None,
                }
            }
        );

        let mut failure: Option<PipelineError> = None;

        let (source, reader_stats) = match reader_result {
            Ok(ReaderOutcome {
                source,
                primary,
                correlation,
                stats,
            }) => {
                if let Err(e) = primary.close().await {
                    error!("{}", e);
                    failure.get_or_insert(e.into());
                }

                if let Err(e) = correlation.close().await {
                    error!("{}", e);
                    failure.get_or_insert(e.into());
                }

                (Some(source), stats)
            }
            Err(e) => {
                error!("{}", e);
                failure.get_or_insert(e);
                let stats = reader_rx.borrow().clone();
                (None, stats)
            }
        };

        let (sink, relay_stats) = match relay_result {
            Some(Ok(RelayOutcome {
                sink,
                client,
                stats,
            })) => {
                if let Some(mut client) = client {
                    client.close().await;
                }

                (Some(sink), Some(stats))
            }
            Some(Err(e)) => {
                error!("{}", e);
                failure.get_or_insert(e);
                (None, relay_rx.as_ref().map(|r| r.borrow().clone()))
            }
            None => (unused_sink, None),
        };

        if let (Some(source), Some(sink)) = (source, sink) {
            if let Err(e) = SerialTransport::unsplit(source, sink).close().await {
                warn!("error closing receiver: {}", e);
            }
        }

        status_cancel.cancel();

        if let Err(e) = status_task.await {
            warn!("status task failed: {}", e);
        }

        let stats = AcquisitionStats::merge(&reader_stats, relay_stats.as_ref(), started.elapsed());

        if let Some(metrics) = &self.metrics {
            metrics.update(&stats);
        }

        for line in stats.final_report() {
            info!("{}", line);
        }

        notify(&self.sink, StatusUpdate::Stats(stats.clone()));

        self.set_state(PipelineState::Stopped {
            failed: failure.is_some(),
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    async fn open_logs(&self) -> Result<(PrimaryLog, CorrelationLog), RecordingError> {
        let paths = &self.settings.paths;

        paths.create_directory().await?;

        let primary = PrimaryLog::create(&paths.primary).await?;
        let correlation = CorrelationLog::create(&paths.correlation).await?;

        Ok((primary, correlation))
    }

    async fn connect_caster(&self) -> Option<CorrectionClient> {
        let caster = match &self.settings.caster {
            Some(c) => c,
            None => {
                info!("No caster configured, logging without RTK corrections");
                return None;
            }
        };

        match CorrectionClient::connect(caster).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(
                    "Caster {} unavailable, logging without corrections until it returns: {}",
                    caster, e
                );
                None
            }
        }
    }

    fn set_state(&self, state: PipelineState) {
        debug!("pipeline {:?}", state);

        self.state.send_replace(state);

        notify(&self.sink, StatusUpdate::State(state));
    }
}

async fn join<O>(
    name: &'static str,
    mut task: JoinHandle<O>,
    timeout: Duration,
) -> Result<O, PipelineError> {
    match tokio::time::timeout(timeout, &mut task).await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(PipelineError::WorkerFailed(name, e)),
        Err(_) => {
            task.abort();
            Err(PipelineError::WorkerTimeout(name, timeout))
        }
    }
}
