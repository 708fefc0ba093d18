use serde::Deserialize;

use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 2101;

/// An NTRIP caster mountpoint supplying RTCM corrections.
#[derive(Clone, Deserialize, Eq, PartialEq)]
pub struct CasterConfig {
    pub host: String,
    pub port: Option<u16>,
    pub mountpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// connect and handshake limit in milliseconds
    pub timeout: Option<u64>,
}

impl CasterConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout.unwrap_or(10_000))
    }

    /// Username and password, only when both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

impl fmt::Display for CasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port(), self.mountpoint)
    }
}

// keeps the password out of logs
impl fmt::Debug for CasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CasterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mountpoint", &self.mountpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
