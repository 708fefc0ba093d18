//! Offline checks that a captured UBX log is usable for PPK processing.

mod report;
mod rules;
mod tally;

pub use report::ValidationReport;
pub use rules::evaluate;
pub use rules::Findings;
pub use rules::MINIMUM_RATE;
pub use rules::MINIMUM_SATELLITES;
pub use tally::Tally;

use crate::ubx::FrameReader;

use std::fs::File;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use tracing::debug;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("file is empty: {0}")]
    Empty(PathBuf),
    #[error("unable to read {0}: {1}")]
    Io(PathBuf, io::Error),
}

/// Replay the log at `path` and evaluate it.
///
/// A missing or empty file is an error rather than a failing report.
pub fn validate(path: &Path) -> Result<ValidationReport, ValidatorError> {
    let io_error = |e: io::Error| match e.kind() {
        io::ErrorKind::NotFound => ValidatorError::NotFound(path.to_path_buf()),
        _ => ValidatorError::Io(path.to_path_buf(), e),
    };

    let file = File::open(path).map_err(io_error)?;
    let size = file.metadata().map_err(io_error)?.len();

    if size == 0 {
        return Err(ValidatorError::Empty(path.to_path_buf()));
    }

    let mut tally = Tally::new(size);
    let mut frames = FrameReader::new(file);

    for frame in &mut frames {
        let frame = frame.map_err(io_error)?;

        tally.record(&frame);
    }

    tally.unparsed_bytes = frames.unparsed_bytes();

    debug!(
        "replayed {} frames from {} ({} checksum failures)",
        tally.total_messages,
        path.display(),
        frames.checksum_failures()
    );

    Ok(ValidationReport::new(path.to_path_buf(), tally))
}

#[cfg(test)]
mod test;
