use crate::acquisition::stats::ReaderStats;
use crate::recording::CorrelationLog;
use crate::recording::PrimaryLog;
use crate::serial::FrameSource;
use crate::time_sync::TimeSyncSampler;
use crate::ubx::decode;
use crate::ubx::DecodedFix;
use crate::ubx::Message;
use crate::ubx::RawFrame;

use chrono::Utc;

use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::sync::watch;

use tokio_util::sync::CancellationToken;

use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

const PARSE_ERROR_REPORT_INTERVAL: u64 = 100;

/// Resources handed back when the read worker exits.
pub struct ReaderOutcome<R> {
    pub source: FrameSource<R>,
    pub primary: PrimaryLog,
    pub correlation: CorrelationLog,
    pub stats: ReaderStats,
}

/// Sole reader of the receiver and sole writer of both log files.
pub struct ReadWorker<R> {
    source: FrameSource<R>,
    primary: PrimaryLog,
    correlation: CorrelationLog,
    sampler: TimeSyncSampler,
    stats: ReaderStats,
    publish: watch::Sender<ReaderStats>,
    read_timeout: Duration,
    error_backoff: Duration,
}

impl<R: AsyncRead + Unpin> ReadWorker<R> {
    pub fn new(
        source: FrameSource<R>,
        primary: PrimaryLog,
        correlation: CorrelationLog,
        sampler: TimeSyncSampler,
        publish: watch::Sender<ReaderStats>,
        read_timeout: Duration,
        error_backoff: Duration,
    ) -> Self {
        ReadWorker {
            source,
            primary,
            correlation,
            sampler,
            stats: ReaderStats::default(),
            publish,
            read_timeout,
            error_backoff,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) -> ReaderOutcome<R> {
        debug!("read worker started");

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.source.read_frame(self.read_timeout) => r,
            };

            self.stats.read_attempts += 1;

            match result {
                Ok(Some(frame)) => self.handle_frame(frame).await,
                Ok(None) => (),
                Err(e) => {
                    self.stats.read_errors += 1;
                    warn!("receiver read error: {}", e);

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => (),
                    }
                }
            }

            self.stats.discarded_bytes = self.source.discarded_bytes();
            self.stats.checksum_failures = self.source.checksum_failures();

            self.publish.send_replace(self.stats.clone());
        }

        debug!("read worker stopped");

        ReaderOutcome {
            source: self.source,
            primary: self.primary,
            correlation: self.correlation,
            stats: self.stats,
        }
    }

    async fn handle_frame(&mut self, frame: RawFrame) {
        trace!("{} ({} bytes)", frame.message_type(), frame.len());

        match self.primary.append(&frame).await {
            Ok(()) => {
                self.stats.messages_logged += 1;
                self.stats.bytes_logged += frame.len() as u64;
            }
            Err(e) => {
                self.stats.write_errors += 1;
                error!("{}", e);
            }
        }

        match decode(&frame) {
            Ok(Some(Message::NavPvt(fix))) => self.handle_fix(fix).await,
            Ok(_) => (),
            Err(e) => {
                self.stats.parse_errors += 1;
                trace!("undecodable payload: {}", e);

                if self.stats.parse_errors % PARSE_ERROR_REPORT_INTERVAL == 0 {
                    warn!(
                        "{} parse errors in {} messages",
                        self.stats.parse_errors, self.stats.messages_logged
                    );
                }
            }
        }
    }

    async fn handle_fix(&mut self, fix: DecodedFix) {
        let sample = self.sampler.sample(&fix, Utc::now());

        self.stats.latest_fix = Some(fix);

        let sample = match sample {
            Ok(Some(sample)) => sample,
            Ok(None) => return,
            Err(e) => {
                debug!("skipping time sample: {}", e);
                return;
            }
        };

        self.stats.time_offset = Some(sample.offset_seconds);

        match self.correlation.append(&sample).await {
            Ok(()) => self.stats.samples_written += 1,
            Err(e) => {
                self.stats.write_errors += 1;
                error!("{}", e);
            }
        }
    }
}
