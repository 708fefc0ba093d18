use crate::ubx::MessageType;
use crate::validator::rules::evaluate;
use crate::validator::Tally;

use serde_json::json;
use serde_json::Map;
use serde_json::Value;

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;
use std::path::PathBuf;

const RULE: &str =
    "================================================================================";

/// Outcome of validating one log file.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub tally: Tally,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub valid: bool,
}

impl ValidationReport {
    pub fn new(path: PathBuf, tally: Tally) -> Self {
        let findings = evaluate(&tally);
        let valid = findings.is_valid();

        ValidationReport {
            path,
            tally,
            errors: findings.errors,
            warnings: findings.warnings,
            valid,
        }
    }

    pub fn to_json(&self) -> Value {
        let tally = &self.tally;

        let message_types: Map<String, Value> = tally
            .message_counts
            .iter()
            .map(|(m, c)| (m.to_string(), json!(c)))
            .collect();

        let fix_types: Map<String, Value> = tally
            .fix_types
            .iter()
            .map(|(f, c)| (f.to_string(), json!(c)))
            .collect();

        let carrier_solutions: Map<String, Value> = tally
            .carrier_solutions
            .iter()
            .map(|(s, c)| (s.to_string(), json!(c)))
            .collect();

        let rates: Map<String, Value> = [MessageType::NavPvt, MessageType::RxmRawx]
            .iter()
            .filter_map(|m| tally.rate(*m).map(|r| (m.to_string(), json!(r))))
            .collect();

        json!({
            "file": self.path.display().to_string(),
            "file_size": tally.file_size,
            "unparsed_bytes": tally.unparsed_bytes,
            "total_messages": tally.total_messages,
            "undecodable_messages": tally.undecodable,
            "first_timestamp": tally.first_timestamp.map(|t| t.to_rfc3339()),
            "last_timestamp": tally.last_timestamp.map(|t| t.to_rfc3339()),
            "duration_seconds": tally.duration(),
            "rates_hz": rates,
            "message_types": message_types,
            "fix_types": fix_types,
            "carrier_solutions": carrier_solutions,
            "max_satellites": tally.max_satellites,
            "warnings": self.warnings,
            "errors": self.errors,
            "valid": self.valid,
        })
    }

    fn nav_pvt_count(&self) -> u64 {
        self.tally.count(MessageType::NavPvt)
    }

    fn rate_suffix(&self, message: MessageType) -> String {
        match self.tally.rate(message) {
            Some(rate) => format!(" ({:.1} Hz)", rate),
            None => String::new(),
        }
    }

    fn write_histogram<K: Display>(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        histogram: &BTreeMap<K, u64>,
    ) -> fmt::Result {
        if histogram.is_empty() {
            return Ok(());
        }

        let total = self.nav_pvt_count();

        writeln!(f, "{}:", title)?;

        for (key, count) in histogram {
            let percent = if total > 0 {
                100.0 * *count as f64 / total as f64
            } else {
                0.0
            };

            writeln!(
                f,
                "  {:20}: {:5} ({:5.1}%)",
                key.to_string(),
                count,
                percent
            )?;
        }

        writeln!(f)
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tally = &self.tally;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "UBX LOG VALIDATION REPORT")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;

        writeln!(f, "File: {}", self.path.display())?;
        writeln!(
            f,
            "Size: {} bytes ({:.2} MB)",
            tally.file_size,
            tally.file_size as f64 / (1024.0 * 1024.0)
        )?;
        writeln!(f)?;

        if let (Some(first), Some(last), Some(duration)) =
            (tally.first_timestamp, tally.last_timestamp, tally.duration())
        {
            writeln!(f, "Time span:")?;
            writeln!(f, "  Start:    {}", first)?;
            writeln!(f, "  End:      {}", last)?;
            writeln!(f, "  Duration: {:.1} seconds", duration)?;
            writeln!(f)?;
        }

        writeln!(f, "Message statistics:")?;
        writeln!(f, "  Total messages:       {}", tally.total_messages)?;
        writeln!(f, "  Undecodable messages: {}", tally.undecodable)?;
        writeln!(f, "  Unparsed bytes:       {}", tally.unparsed_bytes)?;
        writeln!(f)?;

        let rawx = tally.count(MessageType::RxmRawx);
        let sfrbx = tally.count(MessageType::RxmSfrbx);

        writeln!(f, "Critical messages for PPK:")?;

        if rawx > 0 {
            writeln!(
                f,
                "  RXM-RAWX (raw observations):  {} messages{}",
                rawx,
                self.rate_suffix(MessageType::RxmRawx)
            )?;
        } else {
            writeln!(f, "  RXM-RAWX (raw observations):  MISSING")?;
        }

        if sfrbx > 0 {
            writeln!(f, "  RXM-SFRBX (ephemeris):        {} messages", sfrbx)?;
        } else {
            writeln!(f, "  RXM-SFRBX (ephemeris):        MISSING")?;
        }

        writeln!(f)?;

        writeln!(f, "Position/status messages:")?;
        writeln!(
            f,
            "  NAV-PVT (position/velocity):  {} messages{}",
            self.nav_pvt_count(),
            self.rate_suffix(MessageType::NavPvt)
        )?;
        writeln!(
            f,
            "  NAV-STATUS (fix status):      {} messages",
            tally.count(MessageType::NavStatus)
        )?;
        writeln!(
            f,
            "  NAV-SAT (satellite info):     {} messages",
            tally.count(MessageType::NavSat)
        )?;
        writeln!(f)?;

        self.write_histogram(f, "Fix type distribution", &tally.fix_types)?;
        self.write_histogram(
            f,
            "RTK carrier solution distribution",
            &tally.carrier_solutions,
        )?;

        writeln!(f, "Maximum satellites observed: {}", tally.max_satellites)?;
        writeln!(f)?;

        writeln!(f, "All message types:")?;
        for (message, count) in tally.by_count() {
            writeln!(f, "  {:20}: {}", message.to_string(), count)?;
        }
        writeln!(f)?;

        if !self.warnings.is_empty() {
            writeln!(f, "WARNINGS:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
            writeln!(f)?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "ERRORS:")?;
            for error in &self.errors {
                writeln!(f, "  - {}", error)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", RULE)?;

        if self.valid {
            writeln!(f, "PASSED: file appears suitable for PPK processing")?;

            if self.warnings.is_empty() {
                writeln!(f, "  No issues detected")?;
            } else {
                writeln!(f, "  Review the warnings above")?;
            }

            writeln!(f)?;
            writeln!(f, "  Next steps:")?;
            writeln!(
                f,
                "  1. Convert to RINEX: convbin -r ubx -o rinex -od -os -v 3.04 {}",
                self.path.display()
            )?;
            writeln!(
                f,
                "  2. Process with RTKLIB: rnx2rtkp <rover.obs> <base.obs> <nav file>"
            )?;
        } else {
            writeln!(f, "FAILED: file is NOT suitable for PPK processing")?;
            writeln!(
                f,
                "  Check the receiver message configuration and record again"
            )?;
        }

        write!(f, "{}", RULE)
    }
}
