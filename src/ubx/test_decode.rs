use crate::ubx::decode;
use crate::ubx::fixtures;
use crate::ubx::fixtures::Pvt;
use crate::ubx::CarrierSolution;
use crate::ubx::DecodeError;
use crate::ubx::FixType;
use crate::ubx::Message;
use crate::ubx::MessageType;
use crate::ubx::NavPvtFlags;
use crate::ubx::NavPvtValid;
use crate::ubx::RawFrame;
use crate::ubx::TimeError;
use crate::ubx::UtcTime;

use chrono::TimeZone;
use chrono::Utc;

#[test]
fn test_nav_pvt() {
    let pvt = Pvt {
        flags: 0x81, // fix ok, carrier fixed
        ..Pvt::default()
    };

    let fix = match decode(&pvt.frame()).unwrap() {
        Some(Message::NavPvt(fix)) => fix,
        m => unreachable!("expected NAV-PVT, got {:?}", m),
    };

    assert_eq!(2024, fix.utc.year);
    assert_eq!(123_456_789, fix.utc.nanos);
    assert_eq!(NavPvtValid::all() - NavPvtValid::VALID_MAG, fix.valid);
    assert_eq!(FixType::Fix3D, fix.fix_type);
    assert_eq!(NavPvtFlags::GNSS_FIX_OK, fix.flags);
    assert_eq!(CarrierSolution::Fixed, fix.carrier_solution);
    assert_eq!(12, fix.num_satellites);
    assert_approx_eq!(47.6213, fix.latitude, 1e-9);
    assert_approx_eq!(-122.3493, fix.longitude, 1e-9);
    assert_approx_eq!(52.0, fix.height, 1e-9);
    assert_approx_eq!(35.0, fix.height_msl, 1e-9);
    assert_eq!("RTK FIXED", fix.label());
}

#[test]
fn test_nav_pvt_label() {
    let float = Pvt {
        flags: 0x41,
        ..Pvt::default()
    };

    let two_d = Pvt {
        fix_type: 2,
        flags: 0,
        ..Pvt::default()
    };

    let label = |pvt: Pvt| match decode(&pvt.frame()).unwrap() {
        Some(Message::NavPvt(fix)) => fix.label(),
        _ => unreachable!(),
    };

    assert_eq!("RTK FLOAT", label(float));
    assert_eq!("2D FIX", label(two_d));
}

#[test]
fn test_nav_pvt_short() {
    let frame = RawFrame::build(0x01, 0x07, &Pvt::default().payload()[..84]).unwrap();

    let error = decode(&frame).unwrap_err();

    assert_eq!(
        DecodeError::Length {
            message: MessageType::NavPvt,
            expected: 92,
            actual: 84,
        },
        error
    );
}

#[test]
fn test_rxm_rawx() {
    let rawx = match decode(&fixtures::rawx(4)).unwrap() {
        Some(Message::RxmRawx(rawx)) => rawx,
        m => unreachable!("expected RXM-RAWX, got {:?}", m),
    };

    assert_approx_eq!(216_000.0, rawx.receiver_tow);
    assert_eq!(2305, rawx.week);
    assert_eq!(18, rawx.leap_seconds);
    assert_eq!(4, rawx.num_measurements);
}

#[test]
fn test_rxm_rawx_count_mismatch() {
    let mut payload = fixtures::rawx(2).payload().to_vec();
    payload[11] = 3;

    let frame = RawFrame::build(0x02, 0x15, &payload).unwrap();

    assert!(matches!(
        decode(&frame),
        Err(DecodeError::Length {
            expected: 112,
            actual: 80,
            ..
        })
    ));
}

#[test]
fn test_rxm_sfrbx() {
    let sfrbx = match decode(&fixtures::sfrbx()).unwrap() {
        Some(Message::RxmSfrbx(sfrbx)) => sfrbx,
        m => unreachable!("expected RXM-SFRBX, got {:?}", m),
    };

    assert_eq!(7, sfrbx.sv_id);
    assert_eq!(10, sfrbx.num_words);
}

#[test]
fn test_rxm_sfrbx_empty() {
    let frame = RawFrame::build(0x02, 0x13, &[0, 1]).unwrap();

    assert!(matches!(
        decode(&frame),
        Err(DecodeError::Malformed {
            message: MessageType::RxmSfrbx,
            ..
        })
    ));
}

#[test]
fn test_nav_status() {
    let mut payload = vec![0u8; 16];
    payload[4] = 5;
    payload[8..12].copy_from_slice(&31_000u32.to_le_bytes());

    let frame = RawFrame::build(0x01, 0x03, &payload).unwrap();

    match decode(&frame).unwrap() {
        Some(Message::NavStatus(status)) => {
            assert_eq!(FixType::TimeOnly, status.fix_type);
            assert_eq!(31_000, status.time_to_first_fix_ms);
        }
        m => unreachable!("expected NAV-STATUS, got {:?}", m),
    }
}

#[test]
fn test_unknown_message() {
    let frame = RawFrame::build(0x0a, 0x09, &[0; 60]).unwrap();

    assert_eq!(None, decode(&frame).unwrap());
}

#[test]
fn test_utc_time_truncates_to_micros() {
    let utc = UtcTime {
        year: 2024,
        month: 3,
        day: 15,
        hour: 12,
        minute: 30,
        second: 45,
        nanos: 123_456_789,
    };

    let expected = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()
        + chrono::Duration::microseconds(123_456);

    assert_eq!(expected, utc.to_datetime().unwrap());
    assert_eq!(
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap(),
        utc.to_datetime_seconds().unwrap()
    );
}

#[test]
fn test_utc_time_small_negative_fraction() {
    let utc = UtcTime {
        year: 2024,
        month: 3,
        day: 15,
        hour: 12,
        minute: 30,
        second: 45,
        nanos: -21,
    };

    assert_eq!(
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap(),
        utc.to_datetime().unwrap()
    );

    let utc = UtcTime {
        nanos: -999,
        ..utc
    };

    assert_eq!(0, utc.to_datetime().unwrap().timestamp_subsec_micros());
}

#[test]
fn test_utc_time_invalid() {
    let bad_date = UtcTime {
        year: 2024,
        month: 2,
        day: 30,
        ..UtcTime::default()
    };

    assert_eq!(
        Err(TimeError::InvalidDate(2024, 2, 30)),
        bad_date.to_datetime()
    );

    let negative = UtcTime {
        year: 2024,
        month: 1,
        day: 1,
        nanos: -1_000,
        ..UtcTime::default()
    };

    assert!(matches!(
        negative.to_datetime(),
        Err(TimeError::InvalidTime(..))
    ));

    let leap = UtcTime {
        year: 2016,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 60,
        nanos: 0,
    };

    assert!(leap.to_datetime().is_err());
}
