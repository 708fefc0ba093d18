mod client;
mod error;
mod response;

pub use client::CorrectionClient;
pub use error::NtripError;
pub use response::StatusLine;
