use crate::configuration::SerialSettings;
use crate::ubx::Codec;
use crate::ubx::CodecError;
use crate::ubx::RawFrame;

use futures_util::stream::StreamExt;

use std::io;
use std::time::Duration;

use thiserror::Error;

use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::ReadHalf;
use tokio::io::WriteHalf;

use tokio_serial::SerialPort;
use tokio_serial::SerialPortBuilderExt;
use tokio_serial::SerialStream;

use tokio_util::codec::FramedRead;

use tracing::debug;
use tracing::info;
use tracing::warn;

/// Unread input beyond this means the host is not keeping up with the receiver.
const INPUT_BACKLOG_WARNING: u32 = 32 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unable to open serial device {0}: {1}")]
    Open(String, tokio_serial::Error),
    #[error("serial device {0} closed")]
    Closed(String),
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for TransportError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(e) => TransportError::Io(e),
        }
    }
}

/// The receiver link.  Split it so one task owns reading and another owns writing.
pub struct SerialTransport<T> {
    name: String,
    io: T,
}

impl SerialTransport<SerialStream> {
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let stream = settings
            .builder()
            .open_native_async()
            .map_err(|e| TransportError::Open(settings.device.clone(), e))?;

        info!(
            "Opened receiver {} at {} baud",
            settings.device, settings.baud_rate
        );

        match stream.bytes_to_read() {
            Ok(pending) => {
                check_backlog(&settings.device, pending);
            }
            Err(e) => debug!("unable to query input backlog on {}: {}", settings.device, e),
        }

        Ok(SerialTransport::new(settings.device.clone(), stream))
    }
}

impl<T: AsyncRead + AsyncWrite> SerialTransport<T> {
    pub fn new(name: String, io: T) -> Self {
        SerialTransport { name, io }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Separate the read and write directions.
    pub fn split(self) -> (FrameSource<ReadHalf<T>>, CorrectionSink<WriteHalf<T>>) {
        let (read, write) = tokio::io::split(self.io);

        let source = FrameSource {
            name: self.name.clone(),
            framed: FramedRead::new(read, Codec::new()),
        };

        let sink = CorrectionSink {
            name: self.name,
            writer: write,
        };

        (source, sink)
    }

    /// Put the two halves back together so the device can be closed once.
    pub fn unsplit(source: FrameSource<ReadHalf<T>>, sink: CorrectionSink<WriteHalf<T>>) -> Self
    where
        T: Unpin,
    {
        let io = source.framed.into_inner().unsplit(sink.writer);

        SerialTransport {
            name: source.name,
            io,
        }
    }

    pub async fn close(mut self) -> Result<(), TransportError>
    where
        T: Unpin,
    {
        self.io.shutdown().await?;

        debug!("closed serial device {}", self.name);

        Ok(())
    }
}

/// Receiver to host direction, yielding checksummed frames.
pub struct FrameSource<R> {
    name: String,
    framed: FramedRead<R, Codec>,
}

impl<R: AsyncRead + Unpin> FrameSource<R> {
    /// Wait up to `timeout` for the next frame.
    ///
    /// `Ok(None)` is a quiet line.  End of stream is `TransportError::Closed`.
    pub async fn read_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>, TransportError> {
        match tokio::time::timeout(timeout, self.framed.next()).await {
            Err(_) => Ok(None),
            Ok(Some(Ok(frame))) => Ok(Some(frame)),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(None) => Err(TransportError::Closed(self.name.clone())),
        }
    }

    pub fn discarded_bytes(&self) -> u64 {
        self.framed.decoder().discarded_bytes()
    }

    pub fn checksum_failures(&self) -> u64 {
        self.framed.decoder().checksum_failures()
    }
}

/// Warn when the receiver has queued more input than we expect to drain.
fn check_backlog(device: &str, pending: u32) -> bool {
    if pending <= INPUT_BACKLOG_WARNING {
        return false;
    }

    warn!(
        "{} bytes already waiting on {}, data may have been lost",
        pending, device
    );

    true
}

/// Host to receiver direction, used for RTCM corrections.
pub struct CorrectionSink<W> {
    name: String,
    writer: W,
}

impl<W: AsyncWrite + Unpin> CorrectionSink<W> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write all of `buf` and return its length.
    pub async fn write_bytes(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.writer.write_all(buf).await?;
        self.writer.flush().await?;

        Ok(buf.len())
    }
}
