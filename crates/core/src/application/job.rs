// Job execution contract

use crate::domain::Recurrence;
use crate::error::Result;
use crate::port::LogSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Business logic of a job.
///
/// `execute` runs once for the trigger time `now` and returns the success
/// summary. Errors become Failure results at the scheduler's dispatch boundary.
#[async_trait]
pub trait JobLogic: Send + Sync {
    async fn execute(&self, now: DateTime<Utc>) -> Result<String>;
}

/// A named job bound to its recurrence rule and its log sink
#[derive(Clone)]
pub struct JobDefinition {
    pub name: String,
    pub recurrence: Recurrence,
    pub logic: Arc<dyn JobLogic>,
    pub sink: Arc<dyn LogSink>,
}

impl JobDefinition {
    pub fn new(
        name: impl Into<String>,
        recurrence: Recurrence,
        logic: Arc<dyn JobLogic>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            name: name.into(),
            recurrence,
            logic,
            sink,
        }
    }
}

impl fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("recurrence", &self.recurrence.to_string())
            .finish_non_exhaustive()
    }
}
