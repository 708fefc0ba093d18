use crate::ntrip::StatusLine;

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NtripError {
    #[error("unable to connect to caster {0}: {1}")]
    Connect(String, io::Error),
    #[error("caster handshake timed out after {0:?}")]
    Timeout(Duration),
    #[error("caster rejected the request: {0}")]
    Rejected(StatusLine),
    #[error("unrecognized caster response {0:?}")]
    InvalidResponse(String),
    #[error("caster response header exceeds {0} bytes")]
    HeaderTooLong(usize),
    #[error("caster closed the connection")]
    Disconnected,
    #[error("connection is closed")]
    Closed,
    #[error("caster I/O error: {0}")]
    Io(#[from] io::Error),
}
