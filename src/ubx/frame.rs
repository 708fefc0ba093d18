use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

pub const SYNC_CHAR_1: u8 = 0xb5;
pub const SYNC_CHAR_2: u8 = 0x62;

pub const HEADER_LEN: usize = 6;
pub const CHECKSUM_LEN: usize = 2;

/// Largest payload accepted before a length field is treated as noise.  RXM-RAWX with 255
/// measurements is 8176 bytes.
pub const MAX_PAYLOAD_LEN: usize = 8192;

/// 8-bit Fletcher checksum over class, id, length and payload.
pub fn checksum(bytes: &[u8]) -> (u8, u8) {
    bytes.iter().fold((0u8, 0u8), |(a, b), byte| {
        let a = a.wrapping_add(*byte);

        (a, b.wrapping_add(a))
    })
}

/// One UBX frame exactly as it arrived on the wire.
///
/// The bytes include the sync characters, header and checksum.  They are never modified after
/// framing, so writing them out reproduces the receiver output bit for bit.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RawFrame {
    bytes: Bytes,
}

impl RawFrame {
    /// Wrap bytes the codec has already validated.
    pub(crate) fn from_validated(bytes: Bytes) -> Self {
        RawFrame { bytes }
    }

    /// Build a frame for `class` and `id` around `payload`, computing the checksum.
    pub fn build(class: u8, id: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }

        let mut bytes = BytesMut::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);

        bytes.put_u8(SYNC_CHAR_1);
        bytes.put_u8(SYNC_CHAR_2);
        bytes.put_u8(class);
        bytes.put_u8(id);
        bytes.put_u16_le(payload.len() as u16);
        bytes.put_slice(payload);

        let (ck_a, ck_b) = checksum(&bytes[2..]);

        bytes.put_u8(ck_a);
        bytes.put_u8(ck_b);

        Ok(RawFrame {
            bytes: bytes.freeze(),
        })
    }

    pub fn class(&self) -> u8 {
        self.bytes[2]
    }

    pub fn id(&self) -> u8 {
        self.bytes[3]
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from((self.class(), self.id()))
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..self.bytes.len() - CHECKSUM_LEN]
    }

    /// The original bytes, including framing and checksum.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Recompute the checksum over the header and payload and compare it with the trailer.
    pub fn checksum_valid(&self) -> bool {
        let end = self.bytes.len() - CHECKSUM_LEN;

        checksum(&self.bytes[2..end]) == (self.bytes[end], self.bytes[end + 1])
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload of {0} bytes exceeds the UBX maximum")]
    PayloadTooLong(usize),
}

/// Message identity from the class and id header bytes.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MessageType {
    NavPvt,
    NavStatus,
    NavSat,
    RxmRawx,
    RxmSfrbx,
    Other { class: u8, id: u8 },
}

impl MessageType {
    pub fn class_id(&self) -> (u8, u8) {
        match self {
            MessageType::NavPvt => (0x01, 0x07),
            MessageType::NavStatus => (0x01, 0x03),
            MessageType::NavSat => (0x01, 0x35),
            MessageType::RxmRawx => (0x02, 0x15),
            MessageType::RxmSfrbx => (0x02, 0x13),
            MessageType::Other { class, id } => (*class, *id),
        }
    }

    pub fn name(&self) -> Cow<'static, str> {
        let (class, id) = self.class_id();

        if let Some(name) = known_name(class, id) {
            return Cow::Borrowed(name);
        }

        match class_name(class) {
            Some(class_name) => Cow::Owned(format!("{}-0x{:02X}", class_name, id)),
            None => Cow::Owned(format!("0x{:02X}-0x{:02X}", class, id)),
        }
    }
}

impl From<(u8, u8)> for MessageType {
    fn from((class, id): (u8, u8)) -> Self {
        match (class, id) {
            (0x01, 0x07) => MessageType::NavPvt,
            (0x01, 0x03) => MessageType::NavStatus,
            (0x01, 0x35) => MessageType::NavSat,
            (0x02, 0x15) => MessageType::RxmRawx,
            (0x02, 0x13) => MessageType::RxmSfrbx,
            (class, id) => MessageType::Other { class, id },
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn class_name(class: u8) -> Option<&'static str> {
    let name = match class {
        0x01 => "NAV",
        0x02 => "RXM",
        0x04 => "INF",
        0x05 => "ACK",
        0x06 => "CFG",
        0x09 => "UPD",
        0x0a => "MON",
        0x0b => "AID",
        0x0d => "TIM",
        0x10 => "ESF",
        0x13 => "MGA",
        0x21 => "LOG",
        0x27 => "SEC",
        0x28 => "HNR",
        _ => return None,
    };

    Some(name)
}

fn known_name(class: u8, id: u8) -> Option<&'static str> {
    let name = match (class, id) {
        (0x01, 0x01) => "NAV-POSECEF",
        (0x01, 0x02) => "NAV-POSLLH",
        (0x01, 0x03) => "NAV-STATUS",
        (0x01, 0x04) => "NAV-DOP",
        (0x01, 0x07) => "NAV-PVT",
        (0x01, 0x12) => "NAV-VELNED",
        (0x01, 0x14) => "NAV-HPPOSLLH",
        (0x01, 0x20) => "NAV-TIMEGPS",
        (0x01, 0x21) => "NAV-TIMEUTC",
        (0x01, 0x22) => "NAV-CLOCK",
        (0x01, 0x35) => "NAV-SAT",
        (0x01, 0x3c) => "NAV-RELPOSNED",
        (0x01, 0x43) => "NAV-SIG",
        (0x02, 0x13) => "RXM-SFRBX",
        (0x02, 0x15) => "RXM-RAWX",
        (0x02, 0x32) => "RXM-RTCM",
        (0x05, 0x00) => "ACK-NAK",
        (0x05, 0x01) => "ACK-ACK",
        (0x0a, 0x09) => "MON-HW",
        (0x0a, 0x36) => "MON-COMMS",
        (0x0d, 0x01) => "TIM-TP",
        _ => return None,
    };

    Some(name)
}
