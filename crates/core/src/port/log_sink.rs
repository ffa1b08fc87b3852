// Execution Log Sink Port
// Append-only record of job executions, one line per JobResult

use crate::domain::JobResult;
use async_trait::async_trait;
use thiserror::Error;

/// Sink failures. Diagnostic only: they never change a job's outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogSinkError {
    #[error("IO error: {0}")]
    Io(String),
}

#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append `result.log_line()` to the target
    async fn append(&self, result: &JobResult) -> Result<(), LogSinkError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "test-util"))]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Sink keeping lines in memory
    #[derive(Default)]
    pub struct MemoryLogSink {
        lines: Mutex<Vec<String>>,
        results: Mutex<Vec<JobResult>>,
    }

    impl MemoryLogSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        pub fn results(&self) -> Vec<JobResult> {
            self.results.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LogSink for MemoryLogSink {
        async fn append(&self, result: &JobResult) -> Result<(), LogSinkError> {
            self.lines.lock().unwrap().push(result.log_line());
            self.results.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    /// Sink whose target is always broken
    pub struct FailingLogSink;

    #[async_trait]
    impl LogSink for FailingLogSink {
        async fn append(&self, _result: &JobResult) -> Result<(), LogSinkError> {
            Err(LogSinkError::Io("disk full".to_string()))
        }
    }
}
