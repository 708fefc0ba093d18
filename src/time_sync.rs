//! Correlation between the local clock and receiver time.
//!
//! Receiver UTC is converted to GPS week and time of week by counting from the GPS epoch.  Leap
//! seconds are not applied, so the week and time of week are UTC based.

use crate::ubx::DecodedFix;
use crate::ubx::TimeError;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;

use std::time::Duration;

/// 1980-01-06T00:00:00Z as a Unix timestamp
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;

pub const SECONDS_PER_WEEK: f64 = 604_800.0;

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

pub const CSV_HEADER: &str = "system_time,gps_time,gps_week,gps_tow,offset_seconds,num_satellites";

#[derive(Clone, Debug, PartialEq)]
pub struct TimeSyncSample {
    pub system_time: DateTime<Utc>,
    pub gps_time: DateTime<Utc>,
    pub gps_week: i64,
    /// seconds
    pub gps_tow: f64,
    /// system time minus receiver time, seconds
    pub offset_seconds: f64,
    pub num_satellites: u8,
}

impl TimeSyncSample {
    pub fn csv_row(&self) -> String {
        format!(
            "{:.6},{},{},{:.3},{:.6},{}",
            unix_seconds(&self.system_time),
            self.gps_time.to_rfc3339_opts(SecondsFormat::Micros, false),
            self.gps_week,
            self.gps_tow,
            self.offset_seconds,
            self.num_satellites
        )
    }
}

/// Emits at most one sample per interval, measured from when sampling began.
#[derive(Clone, Debug)]
pub struct TimeSyncSampler {
    interval: chrono::Duration,
    last_sample: DateTime<Utc>,
    latest_offset: Option<f64>,
}

impl TimeSyncSampler {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_interval(start, SAMPLE_INTERVAL)
    }

    pub fn with_interval(start: DateTime<Utc>, interval: Duration) -> Self {
        let interval =
            chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::seconds(10));

        TimeSyncSampler {
            interval,
            last_sample: start,
            latest_offset: None,
        }
    }

    /// Offset from the most recent sample
    pub fn latest_offset(&self) -> Option<f64> {
        self.latest_offset
    }

    /// Produce a sample when the interval has elapsed at `system_time`.
    ///
    /// A fix whose time cannot be converted is an error and leaves the interval running, so the
    /// next good fix is sampled.
    pub fn sample(
        &mut self,
        fix: &DecodedFix,
        system_time: DateTime<Utc>,
    ) -> Result<Option<TimeSyncSample>, TimeError> {
        if system_time - self.last_sample < self.interval {
            return Ok(None);
        }

        let gps_time = fix.utc.to_datetime()?;

        let gps_seconds = unix_seconds(&gps_time);
        let since_epoch = gps_seconds - GPS_EPOCH_UNIX as f64;

        let gps_week = (since_epoch / SECONDS_PER_WEEK).floor() as i64;
        let gps_tow = since_epoch.rem_euclid(SECONDS_PER_WEEK);
        let offset_seconds = unix_seconds(&system_time) - gps_seconds;

        self.last_sample = system_time;
        self.latest_offset = Some(offset_seconds);

        Ok(Some(TimeSyncSample {
            system_time,
            gps_time,
            gps_week,
            gps_tow,
            offset_seconds,
            num_satellites: fix.num_satellites,
        }))
    }
}

pub fn unix_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
}
