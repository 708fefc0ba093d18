use crate::ubx::DecodedFix;

use std::fmt::Write;
use std::time::Duration;

/// Counters owned and published by the read worker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReaderStats {
    pub messages_logged: u64,
    pub bytes_logged: u64,
    pub parse_errors: u64,
    pub read_attempts: u64,
    pub read_errors: u64,
    pub write_errors: u64,
    pub discarded_bytes: u64,
    pub checksum_failures: u64,
    pub samples_written: u64,
    pub latest_fix: Option<DecodedFix>,
    pub time_offset: Option<f64>,
}

/// Counters owned and published by the relay worker.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RelayStats {
    pub correction_bytes_relayed: u64,
    pub chunks_relayed: u64,
    pub connected: bool,
    pub reconnects: u64,
}

/// Read-only view merged from the per-worker statistics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcquisitionStats {
    pub elapsed: Duration,
    pub messages_logged: u64,
    pub bytes_logged: u64,
    pub correction_bytes_relayed: u64,
    pub parse_errors: u64,
    pub total_read_attempts: u64,
    pub read_errors: u64,
    pub samples_written: u64,
    pub latest_fix: Option<DecodedFix>,
    pub time_offset: Option<f64>,
    pub corrections_configured: bool,
    pub caster_connected: bool,
}

impl AcquisitionStats {
    pub fn merge(reader: &ReaderStats, relay: Option<&RelayStats>, elapsed: Duration) -> Self {
        AcquisitionStats {
            elapsed,
            messages_logged: reader.messages_logged,
            bytes_logged: reader.bytes_logged,
            correction_bytes_relayed: relay.map_or(0, |r| r.correction_bytes_relayed),
            parse_errors: reader.parse_errors,
            total_read_attempts: reader.read_attempts,
            read_errors: reader.read_errors,
            samples_written: reader.samples_written,
            latest_fix: reader.latest_fix.clone(),
            time_offset: reader.time_offset,
            corrections_configured: relay.is_some(),
            caster_connected: relay.map_or(false, |r| r.connected),
        }
    }

    /// Average messages per second since logging began
    pub fn message_rate(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();

        if seconds > 0.0 {
            self.messages_logged as f64 / seconds
        } else {
            0.0
        }
    }

    pub fn fix_label(&self) -> String {
        match &self.latest_fix {
            Some(fix) => fix.label(),
            None => "NO FIX".to_string(),
        }
    }

    /// One line periodic status report.
    pub fn status_line(&self) -> String {
        let mut line = format!("Fix: {:15}", self.fix_label());

        match &self.latest_fix {
            Some(fix) => {
                let _ = write!(
                    line,
                    " | Sats: {:2} | Lat: {:12.8} | Lon: {:13.8} | Alt: {:7.2}m",
                    fix.num_satellites, fix.latitude, fix.longitude, fix.height
                );
            }
            None => line.push_str(" | Sats: -- | Lat: --- | Lon: --- | Alt: ---"),
        }

        match self.time_offset {
            Some(offset) => {
                let _ = write!(line, " | Time offset: {:+7.3}s", offset);
            }
            None => line.push_str(" | Time offset: ---"),
        }

        let _ = write!(
            line,
            " | Msgs: {} ({:.1} Hz) | Logged: {:.1} KB | RTCM: {:.1} KB{}",
            self.messages_logged,
            self.message_rate(),
            self.bytes_logged as f64 / 1024.0,
            self.correction_bytes_relayed as f64 / 1024.0,
            self.corrections_marker()
        );

        line
    }

    /// Short form for a small status display.
    pub fn compact_summary(&self) -> String {
        let sats = self.latest_fix.as_ref().map_or(0, |f| f.num_satellites);

        format!(
            "{} {}sv {:.0}KB",
            self.fix_label(),
            sats,
            self.bytes_logged as f64 / 1024.0
        )
    }

    /// Summary lines reported once logging stops.
    pub fn final_report(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Duration: {:.1} seconds", self.elapsed.as_secs_f64()),
            format!(
                "Messages logged: {} ({:.1} Hz average)",
                self.messages_logged,
                self.message_rate()
            ),
            format!(
                "Data logged: {:.2} MB",
                self.bytes_logged as f64 / (1024.0 * 1024.0)
            ),
        ];

        if self.corrections_configured {
            lines.push(format!(
                "RTCM corrections: {:.1} KB",
                self.correction_bytes_relayed as f64 / 1024.0
            ));
        }

        if let Some(offset) = self.time_offset {
            lines.push(format!("Final time offset: {:+.3} seconds", offset));
        }

        lines.push(format!("Time samples written: {}", self.samples_written));

        if self.parse_errors > 0 {
            lines.push(format!("Parse errors: {}", self.parse_errors));
        }

        lines
    }

    fn corrections_marker(&self) -> &'static str {
        match (self.corrections_configured, self.caster_connected) {
            (true, true) => " !!",
            (true, false) => " (caster down)",
            (false, _) => "",
        }
    }
}
