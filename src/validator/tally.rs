use crate::ubx::decode;
use crate::ubx::CarrierSolution;
use crate::ubx::DecodedFix;
use crate::ubx::FixType;
use crate::ubx::Message;
use crate::ubx::MessageType;
use crate::ubx::RawFrame;

use chrono::DateTime;
use chrono::Utc;

use std::collections::BTreeMap;

use tracing::trace;

/// Running counts accumulated while replaying a log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub file_size: u64,
    pub total_messages: u64,
    pub message_counts: BTreeMap<MessageType, u64>,
    /// First NAV-PVT time, whole seconds
    pub first_timestamp: Option<DateTime<Utc>>,
    /// Last NAV-PVT time, whole seconds
    pub last_timestamp: Option<DateTime<Utc>>,
    pub fix_types: BTreeMap<FixType, u64>,
    pub carrier_solutions: BTreeMap<CarrierSolution, u64>,
    /// Highest NAV-PVT satellite count or RXM-RAWX measurement count seen
    pub max_satellites: u8,
    /// Frames of a recognized type whose payload could not be decoded
    pub undecodable: u64,
    pub unparsed_bytes: u64,
}

impl Tally {
    pub fn new(file_size: u64) -> Self {
        Tally {
            file_size,
            ..Tally::default()
        }
    }

    pub fn record(&mut self, frame: &RawFrame) {
        self.total_messages += 1;
        *self.message_counts.entry(frame.message_type()).or_insert(0) += 1;

        match decode(frame) {
            Ok(Some(Message::NavPvt(fix))) => self.record_fix(&fix),
            Ok(Some(Message::RxmRawx(rawx))) => {
                self.max_satellites = self.max_satellites.max(rawx.num_measurements);
            }
            Ok(_) => (),
            Err(e) => {
                trace!("{}", e);
                self.undecodable += 1;
            }
        }
    }

    fn record_fix(&mut self, fix: &DecodedFix) {
        if let Ok(time) = fix.utc.to_datetime_seconds() {
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(time);
            }

            self.last_timestamp = Some(time);
        }

        *self.fix_types.entry(fix.fix_type).or_insert(0) += 1;
        *self
            .carrier_solutions
            .entry(fix.carrier_solution)
            .or_insert(0) += 1;

        self.max_satellites = self.max_satellites.max(fix.num_satellites);
    }

    pub fn count(&self, message: MessageType) -> u64 {
        self.message_counts.get(&message).copied().unwrap_or(0)
    }

    /// Seconds between the first and last NAV-PVT timestamps
    pub fn duration(&self) -> Option<f64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some((last - first).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// Average rate of `message` over the NAV-PVT time span, if that span is positive.
    pub fn rate(&self, message: MessageType) -> Option<f64> {
        match self.duration() {
            Some(seconds) if seconds > 0.0 => Some(self.count(message) as f64 / seconds),
            _ => None,
        }
    }

    /// Message types ordered by descending count.
    pub fn by_count(&self) -> Vec<(MessageType, u64)> {
        let mut counts: Vec<(MessageType, u64)> =
            self.message_counts.iter().map(|(m, c)| (*m, *c)).collect();

        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        counts
    }
}
