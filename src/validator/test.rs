use crate::ubx::fixtures;
use crate::ubx::fixtures::Pvt;
use crate::ubx::CarrierSolution;
use crate::ubx::FixType;
use crate::ubx::MessageType;
use crate::ubx::RawFrame;
use crate::validator::validate;
use crate::validator::ValidatorError;

use chrono::DateTime;
use chrono::Utc;

use std::path::PathBuf;

use tempfile::TempDir;

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn write_log(dir: &TempDir, frames: &[RawFrame]) -> PathBuf {
    let path = dir.path().join("capture.ubx");

    std::fs::write(&path, fixtures::concat(frames)).unwrap();

    path
}

/// 100 seconds at 10 Hz with `rawx` raw measurement frames spread over it.
fn session(rawx: usize) -> Vec<RawFrame> {
    let mut frames = vec![];

    for i in 0..1000 {
        let time = start() + chrono::Duration::milliseconds(100 * i);

        frames.push(
            Pvt {
                num_sv: 8,
                flags: 0x81,
                ..Pvt::at(time)
            }
            .frame(),
        );

        if (i as usize) < rawx {
            frames.push(fixtures::rawx(2));
        }

        if i % 200 == 0 {
            frames.push(fixtures::sfrbx());
        }
    }

    frames
}

#[test]
fn test_validate_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let result = validate(&dir.path().join("missing.ubx"));

    assert!(matches!(result, Err(ValidatorError::NotFound(_))));
}

#[test]
fn test_validate_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &[]);

    let result = validate(&path);

    assert!(matches!(result, Err(ValidatorError::Empty(_))));
}

#[test]
fn test_validate_complete_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &session(1000));

    let report = validate(&path).unwrap();

    assert!(report.valid);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let tally = &report.tally;

    assert_eq!(1000, tally.count(MessageType::NavPvt));
    assert_eq!(1000, tally.count(MessageType::RxmRawx));
    assert_eq!(5, tally.count(MessageType::RxmSfrbx));
    assert_eq!(2005, tally.total_messages);
    assert_eq!(8, tally.max_satellites);
    assert_eq!(0, tally.unparsed_bytes);
    assert_eq!(Some(start()), tally.first_timestamp);
    assert_approx_eq!(99.0, tally.duration().unwrap());
    assert_eq!(Some(&1000), tally.fix_types.get(&FixType::Fix3D));
    assert_eq!(
        Some(&1000),
        tally.carrier_solutions.get(&CarrierSolution::Fixed)
    );

    let text = report.to_string();

    assert!(text.contains("RXM-RAWX (raw observations):  1000 messages (10.1 Hz)"), "{}", text);
    assert!(text.contains("RTK FIXED") || text.contains("Fixed solution"), "{}", text);
    assert!(text.contains("PASSED"), "{}", text);
    assert!(text.contains("No issues detected"), "{}", text);
}

#[test]
fn test_validate_low_raw_measurement_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &session(700));

    let report = validate(&path).unwrap();

    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert_eq!(
        vec!["RXM-RAWX rate is 7.1 Hz (expected ~10 Hz)".to_string()],
        report.warnings
    );
}

#[test]
fn test_validate_missing_raw_measurements() {
    let dir = tempfile::tempdir().unwrap();

    let mut frames: Vec<RawFrame> = (0..5).map(|_| fixtures::sfrbx()).collect();
    frames.push(Pvt::default().frame());

    let path = write_log(&dir, &frames);

    let report = validate(&path).unwrap();

    assert!(!report.valid);
    assert_eq!(1, report.errors.len());
    assert!(report.errors[0].contains("RXM-RAWX"));
    assert!(!report.errors.iter().any(|e| e.contains("RXM-SFRBX")));

    let text = report.to_string();

    assert!(text.contains("RXM-RAWX (raw observations):  MISSING"), "{}", text);
    assert!(text.contains("FAILED"), "{}", text);
}

#[test]
fn test_validate_missing_everything_critical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(
        &dir,
        &[Pvt {
            num_sv: 3,
            ..Pvt::default()
        }
        .frame()],
    );

    let report = validate(&path).unwrap();

    assert!(!report.valid);
    assert_eq!(2, report.errors.len());
    assert_eq!(1, report.warnings.len());
    assert!(report.warnings[0].starts_with("Low satellite count (max: 3)"));
}

#[test]
fn test_validate_counts_noise() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noisy.ubx");

    let rawx = fixtures::rawx(2);
    let short_pvt = RawFrame::build(0x01, 0x07, &[0u8; 20]).unwrap();

    let mut bytes = b"\x00\x01\x02".to_vec();
    bytes.extend_from_slice(fixtures::sfrbx().as_bytes());
    bytes.extend_from_slice(short_pvt.as_bytes());
    bytes.extend_from_slice(rawx.as_bytes());
    bytes.extend_from_slice(&rawx.as_bytes()[..10]);

    std::fs::write(&path, &bytes).unwrap();

    let report = validate(&path).unwrap();
    let tally = &report.tally;

    assert_eq!(bytes.len() as u64, tally.file_size);
    assert_eq!(3, tally.total_messages);
    assert_eq!(1, tally.undecodable);
    assert_eq!(13, tally.unparsed_bytes);
    assert_eq!(None, tally.first_timestamp);
    assert!(report.valid);
}

#[test]
fn test_validate_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &session(700));

    let first = validate(&path).unwrap();
    let second = validate(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.to_json().to_string(), second.to_json().to_string());
}

#[test]
fn test_report_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &session(1000));

    let json = validate(&path).unwrap().to_json();

    assert_eq!(true, json["valid"]);
    assert_eq!(1000, json["message_types"]["NAV-PVT"]);
    assert_eq!(5, json["message_types"]["RXM-SFRBX"]);
    assert_eq!(8, json["max_satellites"]);
    assert_eq!("2024-03-15T12:00:00+00:00", json["first_timestamp"]);
    assert!(json["errors"].as_array().unwrap().is_empty());
}
