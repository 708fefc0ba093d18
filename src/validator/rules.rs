use crate::ubx::MessageType;
use crate::validator::Tally;

/// Nominal output rate is 10 Hz.
pub const MINIMUM_RATE: f64 = 9.5;

pub const MINIMUM_SATELLITES: u8 = 5;

/// Message types checked against `MINIMUM_RATE`.
pub const RATE_CHECKED: [MessageType; 2] = [MessageType::NavPvt, MessageType::RxmRawx];

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Findings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Findings {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Apply the data-quality rules to a completed tally.
pub fn evaluate(tally: &Tally) -> Findings {
    let mut findings = Findings::default();

    if tally.count(MessageType::RxmRawx) == 0 {
        findings.errors.push(
            "No RXM-RAWX raw measurement messages found, they are required for PPK processing"
                .to_string(),
        );
    }

    if tally.count(MessageType::RxmSfrbx) == 0 {
        findings.errors.push(
            "No RXM-SFRBX broadcast ephemeris messages found, they are required for PPK processing"
                .to_string(),
        );
    }

    for message in RATE_CHECKED {
        if let Some(rate) = tally.rate(message) {
            if rate < MINIMUM_RATE {
                findings.warnings.push(format!(
                    "{} rate is {:.1} Hz (expected ~10 Hz)",
                    message, rate
                ));
            }
        }
    }

    if tally.max_satellites < MINIMUM_SATELLITES {
        findings.warnings.push(format!(
            "Low satellite count (max: {}), at least {} are needed for good PPK results",
            tally.max_satellites, MINIMUM_SATELLITES
        ));
    }

    findings
}
