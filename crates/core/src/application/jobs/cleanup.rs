//! Inactive customer cleanup
//!
//! A customer is inactive when it never ordered, or when its latest order is
//! strictly older than `now - inactivity window`. Each run recomputes the
//! deletion set from current state, so a failed or partial run is corrected by
//! the next one.

use crate::application::constants::INACTIVITY_WINDOW_DAYS;
use crate::application::job::JobLogic;
use crate::domain::CustomerId;
use crate::error::Result;
use crate::port::CustomerRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

pub struct CleanupJob {
    repository: Arc<dyn CustomerRepository>,
    inactivity_window: Duration,
}

impl CleanupJob {
    pub fn new(repository: Arc<dyn CustomerRepository>) -> Self {
        Self {
            repository,
            inactivity_window: Duration::days(INACTIVITY_WINDOW_DAYS),
        }
    }

    pub fn with_inactivity_window(mut self, window: Duration) -> Self {
        self.inactivity_window = window;
        self
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.inactivity_window
    }

    /// Union of never-ordered and stale-latest-order customers
    pub async fn deletion_set(&self, now: DateTime<Utc>) -> Result<BTreeSet<CustomerId>> {
        let cutoff = self.cutoff(now);

        let mut ids = self.repository.list_customers_with_no_orders().await?;
        let no_orders = ids.len();

        let stale = self
            .repository
            .list_customers_with_stale_latest_order(cutoff)
            .await?;
        let stale_count = stale.len();
        ids.extend(stale);

        info!(
            cutoff = %cutoff,
            no_orders = no_orders,
            stale_latest_order = stale_count,
            inactive = ids.len(),
            "Computed inactive customers"
        );

        Ok(ids)
    }
}

#[async_trait]
impl JobLogic for CleanupJob {
    async fn execute(&self, now: DateTime<Utc>) -> Result<String> {
        let ids = self.deletion_set(now).await?;

        if ids.is_empty() {
            return Ok("No inactive customers found to delete".to_string());
        }

        let requested = ids.len() as u64;
        let deleted = self.repository.delete_by_ids(&ids).await?;

        if deleted != requested {
            // Concurrent modification between query and delete
            warn!(
                requested = requested,
                deleted = deleted,
                "Repository deleted a different number of customers than requested"
            );
        }

        Ok(format!("Successfully deleted {} inactive customers", requested))
    }
}
