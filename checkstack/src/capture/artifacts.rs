//! Capture files on disk.
//!
//! Two kinds of plain-text file are written per switch:
//!
//! - `<host>.output`: every run's transcript, appended, flushed after
//!   each command so a crash keeps what was already captured.
//! - `<host>_<member>_<YYYYMMDDTHHMMSS>`: one register dump per stack
//!   member per run, ready to be diffed against earlier runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::debug;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{CaptureError, Result};

/// Second resolution keeps member file names unique per run.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Format a member file timestamp.
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Directory the capture files go to.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn host_log_path(&self, host: &str) -> PathBuf {
        self.dir.join(format!("{}.output", host))
    }

    pub fn member_file_path(&self, host: &str, member: &str, stamp: &str) -> PathBuf {
        self.dir.join(format!("{}_{}_{}", host, member, stamp))
    }

    /// Open (creating if needed) the append-only transcript for `host`.
    pub async fn open_host_log(&self, host: &str) -> Result<HostLog> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CaptureError::new(&self.dir, e))?;

        let path = self.host_log_path(host);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| CaptureError::new(&path, e))?;

        debug!("appending to {}", path.display());
        Ok(HostLog { path, file })
    }

    /// Write one member's register dump to its own timestamped file.
    pub async fn write_member_file(
        &self,
        host: &str,
        member: &str,
        text: &str,
        at: &DateTime<Local>,
    ) -> Result<PathBuf> {
        let path = self.member_file_path(host, member, &timestamp(at));

        let write = async {
            let mut file = File::create(&path).await?;
            file.write_all(text.as_bytes()).await?;
            file.flush().await
        };
        write.await.map_err(|e| CaptureError::new(&path, e))?;

        debug!("wrote {}", path.display());
        Ok(path)
    }
}

/// Open handle on a host transcript.
#[derive(Debug)]
pub struct HostLog {
    path: PathBuf,
    file: File,
}

impl HostLog {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append and flush.
    pub async fn append(&mut self, text: &str) -> Result<()> {
        let write = async {
            self.file.write_all(text.as_bytes()).await?;
            self.file.flush().await
        };
        write.await.map_err(|e| CaptureError::new(&self.path, e).into())
    }
}
