use crate::ubx::codec::Codec;
use crate::ubx::frame::RawFrame;

use bytes::BytesMut;

use std::io;
use std::io::Read;

use tokio_util::codec::Decoder;

const READ_SIZE: usize = 64 * 1024;

/// Iterates the frames of a captured byte stream.
///
/// This runs the same scanner as live acquisition so a replayed log yields exactly the frames that
/// were written.
pub struct FrameReader<R> {
    reader: R,
    codec: Codec,
    buf: BytesMut,
    bytes_read: u64,
    eof: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        FrameReader {
            reader,
            codec: Codec::new(),
            buf: BytesMut::with_capacity(READ_SIZE),
            bytes_read: 0,
            eof: false,
        }
    }

    /// Total bytes consumed from the underlying reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Bytes that were not part of any valid frame, including a truncated tail.
    pub fn unparsed_bytes(&self) -> u64 {
        self.codec.discarded_bytes()
    }

    pub fn checksum_failures(&self) -> u64 {
        self.codec.checksum_failures()
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_SIZE];

        let n = loop {
            match self.reader.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if n == 0 {
            self.eof = true;
        } else {
            self.bytes_read += n as u64;
            self.buf.extend_from_slice(&chunk[..n]);
        }

        Ok(())
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = io::Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let decoded = if self.eof {
                self.codec.decode_eof(&mut self.buf)
            } else {
                self.codec.decode(&mut self.buf)
            };

            match decoded {
                Ok(Some(frame)) => return Some(Ok(frame)),
                Ok(None) if self.eof => return None,
                Ok(None) => (),
                Err(e) => return Some(Err(io::Error::new(io::ErrorKind::Other, e))),
            }

            if let Err(e) = self.fill() {
                return Some(Err(e));
            }
        }
    }
}
