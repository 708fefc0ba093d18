use crate::time_sync::TimeSyncSample;
use crate::time_sync::CSV_HEADER;
use crate::ubx::RawFrame;

use chrono::DateTime;
use chrono::TimeZone;

use std::fmt::Display;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::io::BufWriter;

use tracing::info;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("unable to create log directory {0}: {1}")]
    Directory(PathBuf, io::Error),
    #[error("unable to create log file {0}: {1}")]
    Create(PathBuf, io::Error),
    #[error("unable to write {0}: {1}")]
    Write(PathBuf, io::Error),
}

/// File names for one recording session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogPaths {
    pub primary: PathBuf,
    pub correlation: PathBuf,
}

impl LogPaths {
    /// `<directory>/<prefix>_<YYYYmmdd_HHMMSS>.ubx` and a matching `_timesync.csv`
    pub fn new<Tz>(directory: &Path, prefix: &str, started: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let base = format!("{}_{}", prefix, started.format("%Y%m%d_%H%M%S"));

        LogPaths {
            primary: directory.join(format!("{}.ubx", base)),
            correlation: directory.join(format!("{}_timesync.csv", base)),
        }
    }

    pub async fn create_directory(&self) -> Result<(), RecordingError> {
        if let Some(dir) = self.primary.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| RecordingError::Directory(dir.to_path_buf(), e))?;
        }

        Ok(())
    }
}

async fn create(path: &Path) -> Result<File, RecordingError> {
    File::create(path)
        .await
        .map_err(|e| RecordingError::Create(path.to_path_buf(), e))
}

/// Append-only file of frames exactly as received.
pub struct PrimaryLog {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes: u64,
}

impl PrimaryLog {
    pub async fn create(path: &Path) -> Result<Self, RecordingError> {
        let file = create(path).await?;

        info!("Logging receiver output to {}", path.display());

        Ok(PrimaryLog {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            bytes: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far
    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    pub async fn append(&mut self, frame: &RawFrame) -> Result<(), RecordingError> {
        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| RecordingError::Write(self.path.clone(), e))?;

        self.bytes += frame.len() as u64;

        Ok(())
    }

    pub async fn close(mut self) -> Result<(), RecordingError> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| RecordingError::Write(self.path.clone(), e))?;

        info!("Closed {} ({} bytes)", self.path.display(), self.bytes);

        Ok(())
    }
}

/// CSV of clock correlation samples.  Each row is flushed as it is written.
pub struct CorrelationLog {
    path: PathBuf,
    file: File,
    rows: u64,
}

impl CorrelationLog {
    pub async fn create(path: &Path) -> Result<Self, RecordingError> {
        let file = create(path).await?;

        let mut log = CorrelationLog {
            path: path.to_path_buf(),
            file,
            rows: 0,
        };

        log.write_line(CSV_HEADER).await?;

        info!("Logging time correlation to {}", path.display());

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples written, excluding the header
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub async fn append(&mut self, sample: &TimeSyncSample) -> Result<(), RecordingError> {
        self.write_line(&sample.csv_row()).await?;
        self.rows += 1;

        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> Result<(), RecordingError> {
        let mut buf = String::with_capacity(line.len() + 2);
        buf.push_str(line);
        buf.push_str("\r\n");

        if let Err(e) = self.file.write_all(buf.as_bytes()).await {
            return Err(RecordingError::Write(self.path.clone(), e));
        }

        self.file
            .flush()
            .await
            .map_err(|e| RecordingError::Write(self.path.clone(), e))
    }

    pub async fn close(mut self) -> Result<(), RecordingError> {
        self.file
            .shutdown()
            .await
            .map_err(|e| RecordingError::Write(self.path.clone(), e))?;

        info!("Closed {} ({} samples)", self.path.display(), self.rows);

        Ok(())
    }
}
