use crate::ubx::frame::checksum;
use crate::ubx::frame::RawFrame;
use crate::ubx::frame::CHECKSUM_LEN;
use crate::ubx::frame::HEADER_LEN;
use crate::ubx::frame::MAX_PAYLOAD_LEN;
use crate::ubx::frame::SYNC_CHAR_1;
use crate::ubx::frame::SYNC_CHAR_2;

use bytes::Buf;
use bytes::BytesMut;

use std::fmt;
use std::io;

use tokio_util::codec::Decoder;
use tokio_util::codec::Encoder;

use tracing::trace;

/// Scans a byte stream for checksummed UBX frames.
///
/// Bytes that cannot start a frame are skipped and counted.  A frame whose checksum does not
/// match is never emitted; the scan resumes one byte past its sync characters.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Codec {
    discarded_bytes: u64,
    checksum_failures: u64,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes dropped while searching for a valid frame.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    pub fn checksum_failures(&self) -> u64 {
        self.checksum_failures
    }

    fn discard(&mut self, buf: &mut BytesMut, count: usize) {
        if count == 0 {
            return;
        }

        buf.advance(count);
        self.discarded_bytes += count as u64;
    }
}

fn find_sync(buf: &[u8]) -> Option<usize> {
    buf.windows(2)
        .position(|w| w[0] == SYNC_CHAR_1 && w[1] == SYNC_CHAR_2)
}

impl Decoder for Codec {
    type Item = RawFrame;
    type Error = CodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<RawFrame>, CodecError> {
        loop {
            let start = match find_sync(buf) {
                Some(s) => s,
                None => {
                    // a lone first sync char at the end may be completed by the next read
                    let keep = usize::from(buf.last() == Some(&SYNC_CHAR_1));
                    let skip = buf.len() - keep;
                    self.discard(buf, skip);

                    return Ok(None);
                }
            };

            self.discard(buf, start);

            if buf.len() < HEADER_LEN {
                return Ok(None);
            }

            let payload_len = u16::from_le_bytes([buf[4], buf[5]]) as usize;

            if payload_len > MAX_PAYLOAD_LEN {
                trace!("UBX length {} too long, resynchronizing", payload_len);
                self.discard(buf, 1);
                continue;
            }

            let frame_len = HEADER_LEN + payload_len + CHECKSUM_LEN;

            if buf.len() < frame_len {
                buf.reserve(frame_len - buf.len());
                return Ok(None);
            }

            let expected = (buf[frame_len - 2], buf[frame_len - 1]);
            let calculated = checksum(&buf[2..frame_len - CHECKSUM_LEN]);

            if expected != calculated {
                trace!(
                    "UBX checksum mismatch for class 0x{:02X} id 0x{:02X}, given {:?}, calculated {:?}",
                    buf[2],
                    buf[3],
                    expected,
                    calculated
                );
                self.checksum_failures += 1;
                self.discard(buf, 1);
                continue;
            }

            let frame = buf.split_to(frame_len).freeze();

            return Ok(Some(RawFrame::from_validated(frame)));
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<RawFrame>, CodecError> {
        // no more input can complete a partial frame, so rescan past its sync chars
        loop {
            if let Some(frame) = self.decode(buf)? {
                return Ok(Some(frame));
            }

            if buf.is_empty() {
                return Ok(None);
            }

            self.discard(buf, 1);
        }
    }
}

impl Encoder<RawFrame> for Codec {
    type Error = CodecError;

    fn encode(&mut self, frame: RawFrame, buf: &mut BytesMut) -> Result<(), CodecError> {
        trace!("sending {} ({} bytes)", frame.message_type(), frame.len());

        buf.extend_from_slice(frame.as_bytes());

        Ok(())
    }
}

#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(e: io::Error) -> CodecError {
        CodecError::Io(e)
    }
}

impl std::error::Error for CodecError {}
