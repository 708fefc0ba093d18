//! Frame builders shared by the unit tests.

use crate::ubx::RawFrame;

use bytes::BufMut;
use bytes::BytesMut;

use chrono::DateTime;
use chrono::Datelike;
use chrono::Timelike;
use chrono::Utc;

#[derive(Clone, Debug)]
pub struct Pvt {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: i32,
    pub fix_type: u8,
    pub flags: u8,
    pub num_sv: u8,
    pub lat: i32,
    pub lon: i32,
    pub height: i32,
}

impl Default for Pvt {
    fn default() -> Self {
        Pvt {
            year: 2024,
            month: 3,
            day: 15,
            hour: 12,
            minute: 30,
            second: 45,
            nanos: 123_456_789,
            fix_type: 3,
            flags: 0x01,
            num_sv: 12,
            lat: 476_213_000,
            lon: -1_223_493_000,
            height: 52_000,
        }
    }
}

impl Pvt {
    pub fn at(time: DateTime<Utc>) -> Self {
        Pvt {
            year: time.year() as u16,
            month: time.month() as u8,
            day: time.day() as u8,
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second() as u8,
            nanos: time.nanosecond() as i32,
            ..Pvt::default()
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut b = BytesMut::with_capacity(92);

        b.put_u32_le(0); // iTOW
        b.put_u16_le(self.year);
        b.put_u8(self.month);
        b.put_u8(self.day);
        b.put_u8(self.hour);
        b.put_u8(self.minute);
        b.put_u8(self.second);
        b.put_u8(0x07); // valid
        b.put_u32_le(20); // tAcc
        b.put_i32_le(self.nanos);
        b.put_u8(self.fix_type);
        b.put_u8(self.flags);
        b.put_u8(0); // flags2
        b.put_u8(self.num_sv);
        b.put_i32_le(self.lon);
        b.put_i32_le(self.lat);
        b.put_i32_le(self.height);
        b.put_i32_le(self.height - 17_000);
        b.resize(92, 0);

        b.to_vec()
    }

    pub fn frame(&self) -> RawFrame {
        RawFrame::build(0x01, 0x07, &self.payload()).unwrap()
    }
}

pub fn rawx(num_meas: u8) -> RawFrame {
    let mut b = BytesMut::new();

    b.put_f64_le(216_000.0);
    b.put_u16_le(2305);
    b.put_i8(18);
    b.put_u8(num_meas);
    b.put_u8(0x01); // recStat
    b.put_u8(0x01); // version
    b.put_u16_le(0);
    b.resize(16 + 32 * num_meas as usize, 0);

    RawFrame::build(0x02, 0x15, &b).unwrap()
}

pub fn sfrbx() -> RawFrame {
    let mut b = BytesMut::new();

    b.put_u8(0); // gnssId
    b.put_u8(7); // svId
    b.put_u8(0);
    b.put_u8(0);
    b.put_u8(10); // numWords
    b.put_u8(0);
    b.put_u8(2);
    b.put_u8(0);
    b.resize(8 + 4 * 10, 0);

    RawFrame::build(0x02, 0x13, &b).unwrap()
}

pub fn concat(frames: &[RawFrame]) -> Vec<u8> {
    frames
        .iter()
        .flat_map(|f| f.as_bytes().iter().copied())
        .collect()
}
