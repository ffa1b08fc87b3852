// Job Result Domain Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used at the start of every execution log line
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Success { summary: String },
    Failure { error: String },
}

/// Immutable record of one job execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn success(
        job_name: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            started_at,
            finished_at,
            outcome: JobOutcome::Success {
                summary: summary.into(),
            },
        }
    }

    pub fn failure(
        job_name: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            started_at,
            finished_at,
            outcome: JobOutcome::Failure {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }

    /// Human-readable summary: the success text, or `ERROR: <error>`
    pub fn summary(&self) -> String {
        match &self.outcome {
            JobOutcome::Success { summary } => summary.clone(),
            JobOutcome::Failure { error } => format!("ERROR: {}", error),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// `{timestamp} - {summary}` with the execution start time.
    ///
    /// Always a single line: CR and LF in the summary are written as `\r`
    /// and `\n`.
    pub fn log_line(&self) -> String {
        format!(
            "{} - {}",
            self.started_at.format(LOG_TIMESTAMP_FORMAT),
            self.summary().replace('\r', "\\r").replace('\n', "\\n")
        )
    }
}
