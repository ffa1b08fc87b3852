// File-backed execution log
//
// One line per JobResult, appended to a plain text file. Appends are
// serialized per sink so concurrent writers never interleave partial lines.

use async_trait::async_trait;
use crm_jobs_core::domain::JobResult;
use crm_jobs_core::port::{LogSink, LogSinkError};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

pub struct FileLogSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, err: std::io::Error) -> LogSinkError {
        LogSinkError::Io(format!("{}: {}", self.path.display(), err))
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn append(&self, result: &JobResult) -> Result<(), LogSinkError> {
        let mut line = result.log_line();
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!(job = %result.job_name, path = %self.path.display(), "Appended execution log line");
        Ok(())
    }
}
