use crate::ubx::frame::MessageType;
use crate::ubx::frame::RawFrame;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::TimeZone;
use chrono::Utc;

use nom::error::VerboseError;
use nom::number::complete::le_f64;
use nom::number::complete::le_i32;
use nom::number::complete::le_u16;
use nom::number::complete::le_u32;
use nom::number::complete::le_u8;
use nom::IResult;

use std::fmt;

use thiserror::Error;

type Result<'a, T> = IResult<&'a [u8], T, VerboseError<&'a [u8]>>;

pub const NAV_PVT_LEN: usize = 92;
pub const NAV_STATUS_LEN: usize = 16;

/// A typed view of a recognized frame payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    NavPvt(DecodedFix),
    NavStatus(NavStatus),
    NavSat(NavSat),
    RxmRawx(RxmRawx),
    RxmSfrbx(RxmSfrbx),
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    #[error("{message} payload is {actual} bytes, expected {expected}")]
    Length {
        message: MessageType,
        expected: usize,
        actual: usize,
    },
    #[error("{message} payload is malformed: {reason}")]
    Malformed {
        message: MessageType,
        reason: String,
    },
}

/// Decode the payload of `frame` if its type is one we understand.
///
/// Unrecognized message types are `Ok(None)`.  A recognized type whose payload does not have the
/// documented layout is a `DecodeError`; the frame itself is still valid and loggable.
pub fn decode(frame: &RawFrame) -> std::result::Result<Option<Message>, DecodeError> {
    let message = frame.message_type();
    let payload = frame.payload();

    let decoded = match message {
        MessageType::NavPvt => {
            expect_len(message, NAV_PVT_LEN, payload.len())?;
            Message::NavPvt(parse(message, payload, nav_pvt)?)
        }
        MessageType::NavStatus => {
            expect_len(message, NAV_STATUS_LEN, payload.len())?;
            Message::NavStatus(parse(message, payload, nav_status)?)
        }
        MessageType::NavSat => {
            let sat = parse(message, payload, nav_sat)?;
            expect_len(message, 8 + 12 * sat.num_svs as usize, payload.len())?;
            Message::NavSat(sat)
        }
        MessageType::RxmRawx => {
            let rawx = parse(message, payload, rxm_rawx)?;
            expect_len(message, 16 + 32 * rawx.num_measurements as usize, payload.len())?;
            Message::RxmRawx(rawx)
        }
        MessageType::RxmSfrbx => {
            let sfrbx = parse(message, payload, rxm_sfrbx)?;
            expect_len(message, 8 + 4 * sfrbx.num_words as usize, payload.len())?;
            Message::RxmSfrbx(sfrbx)
        }
        MessageType::Other { .. } => return Ok(None),
    };

    Ok(Some(decoded))
}

fn expect_len(
    message: MessageType,
    expected: usize,
    actual: usize,
) -> std::result::Result<(), DecodeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DecodeError::Length {
            message,
            expected,
            actual,
        })
    }
}

fn parse<'a, T>(
    message: MessageType,
    payload: &'a [u8],
    parser: fn(&'a [u8]) -> Result<'a, T>,
) -> std::result::Result<T, DecodeError> {
    match parser(payload) {
        Ok((_, value)) => Ok(value),
        Err(e) => Err(DecodeError::Malformed {
            message,
            reason: e.to_string(),
        }),
    }
}

bitflags! {
    /// NAV-PVT validity flags
    pub struct NavPvtValid: u8 {
        const VALID_DATE = 0x01;
        const VALID_TIME = 0x02;
        const FULLY_RESOLVED = 0x04;
        const VALID_MAG = 0x08;
    }
}

bitflags! {
    /// NAV-PVT fix status flags.  Bits 6 and 7 hold the carrier solution.
    pub struct NavPvtFlags: u8 {
        const GNSS_FIX_OK = 0x01;
        const DIFF_SOLN = 0x02;
        const HEAD_VEH_VALID = 0x20;
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FixType {
    NoFix,
    DeadReckoning,
    Fix2D,
    Fix3D,
    GnssPlusDeadReckoning,
    TimeOnly,
    Unknown(u8),
}

impl From<u8> for FixType {
    fn from(value: u8) -> Self {
        match value {
            0 => FixType::NoFix,
            1 => FixType::DeadReckoning,
            2 => FixType::Fix2D,
            3 => FixType::Fix3D,
            4 => FixType::GnssPlusDeadReckoning,
            5 => FixType::TimeOnly,
            u => FixType::Unknown(u),
        }
    }
}

impl fmt::Display for FixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixType::NoFix => f.write_str("NO FIX"),
            FixType::DeadReckoning => f.write_str("DEAD RECKONING"),
            FixType::Fix2D => f.write_str("2D FIX"),
            FixType::Fix3D => f.write_str("3D FIX"),
            FixType::GnssPlusDeadReckoning => f.write_str("GNSS+DR"),
            FixType::TimeOnly => f.write_str("TIME ONLY"),
            FixType::Unknown(u) => write!(f, "UNKNOWN ({})", u),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CarrierSolution {
    None,
    Float,
    Fixed,
    Unknown(u8),
}

impl From<u8> for CarrierSolution {
    fn from(value: u8) -> Self {
        match value {
            0 => CarrierSolution::None,
            1 => CarrierSolution::Float,
            2 => CarrierSolution::Fixed,
            u => CarrierSolution::Unknown(u),
        }
    }
}

impl fmt::Display for CarrierSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierSolution::None => f.write_str("No carrier"),
            CarrierSolution::Float => f.write_str("Float solution"),
            CarrierSolution::Fixed => f.write_str("Fixed solution"),
            CarrierSolution::Unknown(u) => write!(f, "UNKNOWN ({})", u),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TimeError {
    #[error("invalid calendar date {0:04}-{1:02}-{2:02}")]
    InvalidDate(u16, u8, u8),
    #[error("invalid time of day {0:02}:{1:02}:{2:02}.{3:09}")]
    InvalidTime(u8, u8, u8, i32),
}

/// Calendar UTC time as reported by the receiver.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Fraction of a second in nanoseconds, -1e9..1e9
    pub nanos: i32,
}

impl UtcTime {
    /// Convert to a timestamp with the fraction truncated toward zero to microseconds.
    ///
    /// A fraction that is still negative after truncation is an error.
    pub fn to_datetime(&self) -> std::result::Result<DateTime<Utc>, TimeError> {
        let micros = self.nanos / 1_000;

        if micros < 0 {
            return Err(self.invalid_time());
        }

        self.build(micros as u32)
    }

    /// Convert to a timestamp ignoring the fraction of a second.
    pub fn to_datetime_seconds(&self) -> std::result::Result<DateTime<Utc>, TimeError> {
        self.build(0)
    }

    fn build(&self, micros: u32) -> std::result::Result<DateTime<Utc>, TimeError> {
        let date = NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())
            .ok_or(TimeError::InvalidDate(self.year, self.month, self.day))?;

        if self.second > 59 || micros >= 1_000_000 {
            return Err(self.invalid_time());
        }

        let time = date
            .and_hms_micro_opt(
                self.hour.into(),
                self.minute.into(),
                self.second.into(),
                micros,
            )
            .ok_or_else(|| self.invalid_time())?;

        Ok(Utc.from_utc_datetime(&time))
    }

    fn invalid_time(&self) -> TimeError {
        TimeError::InvalidTime(self.hour, self.minute, self.second, self.nanos)
    }
}

/// Navigation solution from NAV-PVT.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFix {
    /// GPS time of week of the navigation epoch in milliseconds
    pub itow: u32,
    pub utc: UtcTime,
    pub valid: NavPvtValid,
    pub fix_type: FixType,
    pub flags: NavPvtFlags,
    pub carrier_solution: CarrierSolution,
    pub num_satellites: u8,
    /// degrees
    pub latitude: f64,
    /// degrees
    pub longitude: f64,
    /// height above the ellipsoid in meters
    pub height: f64,
    /// height above mean sea level in meters
    pub height_msl: f64,
}

impl DecodedFix {
    /// Fix description preferring the RTK carrier solution when there is one.
    pub fn label(&self) -> String {
        match self.carrier_solution {
            CarrierSolution::Fixed => "RTK FIXED".to_string(),
            CarrierSolution::Float => "RTK FLOAT".to_string(),
            _ => self.fix_type.to_string(),
        }
    }
}

fn nav_pvt(input: &[u8]) -> Result<DecodedFix> {
    let (input, itow) = le_u32(input)?;
    let (input, year) = le_u16(input)?;
    let (input, month) = le_u8(input)?;
    let (input, day) = le_u8(input)?;
    let (input, hour) = le_u8(input)?;
    let (input, minute) = le_u8(input)?;
    let (input, second) = le_u8(input)?;
    let (input, valid) = le_u8(input)?;
    let (input, _time_accuracy) = le_u32(input)?;
    let (input, nanos) = le_i32(input)?;
    let (input, fix_type) = le_u8(input)?;
    let (input, flags) = le_u8(input)?;
    let (input, _flags2) = le_u8(input)?;
    let (input, num_satellites) = le_u8(input)?;
    let (input, lon) = le_i32(input)?;
    let (input, lat) = le_i32(input)?;
    let (input, height) = le_i32(input)?;
    let (input, height_msl) = le_i32(input)?;

    let fix = DecodedFix {
        itow,
        utc: UtcTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanos,
        },
        valid: NavPvtValid::from_bits_truncate(valid),
        fix_type: FixType::from(fix_type),
        flags: NavPvtFlags::from_bits_truncate(flags),
        carrier_solution: CarrierSolution::from((flags >> 6) & 0x03),
        num_satellites,
        latitude: lat as f64 * 1e-7,
        longitude: lon as f64 * 1e-7,
        height: height as f64 * 1e-3,
        height_msl: height_msl as f64 * 1e-3,
    };

    Ok((input, fix))
}

/// Receiver navigation status from NAV-STATUS.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavStatus {
    pub itow: u32,
    pub fix_type: FixType,
    pub time_to_first_fix_ms: u32,
    pub uptime_ms: u32,
}

fn nav_status(input: &[u8]) -> Result<NavStatus> {
    let (input, itow) = le_u32(input)?;
    let (input, fix_type) = le_u8(input)?;
    let (input, _flags) = le_u8(input)?;
    let (input, _fix_stat) = le_u8(input)?;
    let (input, _flags2) = le_u8(input)?;
    let (input, time_to_first_fix_ms) = le_u32(input)?;
    let (input, uptime_ms) = le_u32(input)?;

    Ok((
        input,
        NavStatus {
            itow,
            fix_type: FixType::from(fix_type),
            time_to_first_fix_ms,
            uptime_ms,
        },
    ))
}

/// Satellite summary header from NAV-SAT.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavSat {
    pub itow: u32,
    pub num_svs: u8,
}

fn nav_sat(input: &[u8]) -> Result<NavSat> {
    let (input, itow) = le_u32(input)?;
    let (input, _version) = le_u8(input)?;
    let (input, num_svs) = le_u8(input)?;

    Ok((input, NavSat { itow, num_svs }))
}

/// Raw measurement header from RXM-RAWX.
#[derive(Clone, Debug, PartialEq)]
pub struct RxmRawx {
    /// receiver time of week in seconds
    pub receiver_tow: f64,
    pub week: u16,
    pub leap_seconds: i8,
    pub num_measurements: u8,
}

fn rxm_rawx(input: &[u8]) -> Result<RxmRawx> {
    let (input, receiver_tow) = le_f64(input)?;
    let (input, week) = le_u16(input)?;
    let (input, leap_seconds) = le_u8(input)?;
    let (input, num_measurements) = le_u8(input)?;

    Ok((
        input,
        RxmRawx {
            receiver_tow,
            week,
            leap_seconds: leap_seconds as i8,
            num_measurements,
        },
    ))
}

/// Broadcast navigation subframe header from RXM-SFRBX.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RxmSfrbx {
    pub gnss_id: u8,
    pub sv_id: u8,
    pub num_words: u8,
}

fn rxm_sfrbx(input: &[u8]) -> Result<RxmSfrbx> {
    let (input, gnss_id) = le_u8(input)?;
    let (input, sv_id) = le_u8(input)?;
    let (input, _sig_id) = le_u8(input)?;
    let (input, _freq_id) = le_u8(input)?;
    let (input, num_words) = le_u8(input)?;

    Ok((
        input,
        RxmSfrbx {
            gnss_id,
            sv_id,
            num_words,
        },
    ))
}
