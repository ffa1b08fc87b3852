// Liveness heartbeat
//
// Always succeeds: the line proves the scheduler is alive, the probe result
// is informational.

use crate::application::constants::HEARTBEAT_ERROR_MAX_CHARS;
use crate::application::job::JobLogic;
use crate::error::Result;
use crate::port::HealthProbe;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

pub struct HeartbeatJob {
    probe: Arc<dyn HealthProbe>,
}

impl HeartbeatJob {
    pub fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl JobLogic for HeartbeatJob {
    async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
        let status = match self.probe.ping().await {
            Ok(reply) => format!("GraphQL: {}", reply),
            Err(e) => {
                warn!(error = %e, "Heartbeat probe failed");
                let reason: String = e.to_string().chars().take(HEARTBEAT_ERROR_MAX_CHARS).collect();
                format!("GraphQL Error: {}", reason)
            }
        };

        Ok(format!("CRM is alive | {}", status))
    }
}
