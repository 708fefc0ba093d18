use crate::configuration::CasterConfig;
use crate::ntrip::response::status_line;
use crate::ntrip::NtripError;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use tracing::debug;
use tracing::info;
use tracing::trace;

const MAX_HEADER_LEN: usize = 8 * 1024;
const READ_SIZE: usize = 4096;

/// An NTRIP v1 client streaming RTCM corrections from one caster mountpoint.
pub struct CorrectionClient {
    name: String,
    stream: Option<TcpStream>,
    pending: BytesMut,
    /// ICY replies end with a blank line that may arrive after the status line.
    blank_line_expected: bool,
}

impl CorrectionClient {
    /// Connect to the caster and complete the request handshake.
    ///
    /// The whole exchange is bounded by the configured timeout.
    pub async fn connect(config: &CasterConfig) -> Result<Self, NtripError> {
        let timeout = config.timeout();

        match tokio::time::timeout(timeout, handshake(config)).await {
            Ok(result) => result,
            Err(_) => Err(NtripError::Timeout(timeout)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Read whatever correction bytes arrive within `timeout`.
    ///
    /// `Ok(None)` means nothing arrived; the caller decides how long to wait before polling again.
    pub async fn read_corrections(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Bytes>, NtripError> {
        if !self.pending.is_empty() {
            return Ok(Some(self.pending.split().freeze()));
        }

        let stream = match self.stream.as_mut() {
            Some(s) => s,
            None => return Err(NtripError::Closed),
        };

        let mut buf = BytesMut::with_capacity(READ_SIZE);

        match tokio::time::timeout(timeout, stream.read_buf(&mut buf)).await {
            Err(_) => Ok(None),
            Ok(Ok(0)) => {
                self.stream = None;
                Err(NtripError::Disconnected)
            }
            Ok(Ok(n)) => {
                trace!("read {} correction bytes from {}", n, self.name);

                strip_blank_line(&mut self.blank_line_expected, &mut buf);

                if buf.is_empty() {
                    return Ok(None);
                }

                Ok(Some(buf.freeze()))
            }
            Ok(Err(e)) => Err(NtripError::Io(e)),
        }
    }

    /// Release the connection.  Closing twice is harmless.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("error shutting down caster connection {}: {}", self.name, e);
            }

            info!("Closed caster connection {}", self.name);
        }

        self.pending.clear();
    }
}

pub(crate) fn request(config: &CasterConfig) -> String {
    let mut request = format!(
        "GET /{} HTTP/1.0\r\nUser-Agent: NTRIP {}/{}\r\n",
        config.mountpoint,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    if let Some((username, password)) = config.credentials() {
        let token = STANDARD.encode(format!("{}:{}", username, password));

        request.push_str(&format!("Authorization: Basic {}\r\n", token));
    }

    request.push_str("\r\n");

    request
}

async fn handshake(config: &CasterConfig) -> Result<CorrectionClient, NtripError> {
    let name = config.to_string();

    let mut stream = TcpStream::connect((config.host.as_str(), config.port()))
        .await
        .map_err(|e| NtripError::Connect(name.clone(), e))?;

    stream.write_all(request(config).as_bytes()).await?;

    let mut buf = BytesMut::with_capacity(READ_SIZE);

    let line = read_line(&mut stream, &mut buf).await?;

    let status = match status_line(&line) {
        Ok((_, status)) => status,
        Err(_) => {
            let line = String::from_utf8_lossy(&line).trim_end().to_string();
            return Err(NtripError::InvalidResponse(line));
        }
    };

    if !status.is_success() {
        return Err(NtripError::Rejected(status));
    }

    let mut blank_line_expected = !status.has_headers();

    if status.has_headers() {
        loop {
            let header = read_line(&mut stream, &mut buf).await?;

            if header.as_ref() == b"\r\n" || header.as_ref() == b"\n" {
                break;
            }

            trace!("caster header {:?}", String::from_utf8_lossy(&header));
        }
    } else {
        strip_blank_line(&mut blank_line_expected, &mut buf);
    }

    info!("Connected to caster {} ({})", name, status);

    Ok(CorrectionClient {
        name,
        stream: Some(stream),
        pending: buf,
        blank_line_expected,
    })
}

/// Drop a leading CRLF from the first data seen while one is `expected`.
fn strip_blank_line(expected: &mut bool, data: &mut BytesMut) {
    if !*expected || data.is_empty() {
        return;
    }

    if data.starts_with(b"\r\n") {
        data.advance(2);
    }

    *expected = false;
}

/// Read up to and including the next newline, leaving anything after it in `buf`.
async fn read_line(stream: &mut TcpStream, buf: &mut BytesMut) -> Result<Bytes, NtripError> {
    let mut searched = 0;

    loop {
        if let Some(i) = buf[searched..].iter().position(|b| *b == b'\n') {
            return Ok(buf.split_to(searched + i + 1).freeze());
        }

        searched = buf.len();

        if searched > MAX_HEADER_LEN {
            return Err(NtripError::HeaderTooLong(MAX_HEADER_LEN));
        }

        if stream.read_buf(buf).await? == 0 {
            return Err(NtripError::Disconnected);
        }
    }
}
