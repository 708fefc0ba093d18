use crate::acquisition::stats::AcquisitionStats;
use crate::acquisition::stats::ReaderStats;
use crate::acquisition::stats::RelayStats;
use crate::acquisition::PipelineState;
use crate::prometheus::Metrics;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use tokio_util::sync::CancellationToken;

use tracing::info;
use tracing::trace;

/// Messages for an optional external status display.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusUpdate {
    State(PipelineState),
    Stats(AcquisitionStats),
}

pub type StatusSender = mpsc::Sender<StatusUpdate>;
pub type StatusReceiver = mpsc::Receiver<StatusUpdate>;

/// Deliver `update` if the sink has room.  A full or closed sink drops it.
pub(crate) fn notify(sink: &Option<StatusSender>, update: StatusUpdate) {
    let sink = match sink {
        Some(s) => s,
        None => return,
    };

    match sink.try_send(update) {
        Ok(()) => (),
        Err(TrySendError::Full(_)) => trace!("status sink full, dropping update"),
        Err(TrySendError::Closed(_)) => trace!("status sink closed, dropping update"),
    }
}

/// Periodically merges worker statistics into a snapshot and reports it.
pub struct StatusReporter {
    reader: watch::Receiver<ReaderStats>,
    relay: Option<watch::Receiver<RelayStats>>,
    started: Instant,
    interval: Duration,
    sink: Option<StatusSender>,
    metrics: Option<Metrics>,
}

impl StatusReporter {
    pub fn new(
        reader: watch::Receiver<ReaderStats>,
        relay: Option<watch::Receiver<RelayStats>>,
        started: Instant,
        interval: Duration,
    ) -> Self {
        StatusReporter {
            reader,
            relay,
            started,
            interval,
            sink: None,
            metrics: None,
        }
    }

    pub fn with_sink(mut self, sink: Option<StatusSender>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_metrics(mut self, metrics: Option<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn snapshot(&self) -> AcquisitionStats {
        let reader = self.reader.borrow().clone();
        let relay = self.relay.as_ref().map(|r| r.borrow().clone());

        AcquisitionStats::merge(&reader, relay.as_ref(), self.started.elapsed())
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval_at(self.started + self.interval, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => self.report(),
            }
        }
    }

    fn report(&self) {
        let stats = self.snapshot();

        info!("{}", stats.status_line());

        if let Some(metrics) = &self.metrics {
            metrics.update(&stats);
        }

        notify(&self.sink, StatusUpdate::Stats(stats));
    }
}
