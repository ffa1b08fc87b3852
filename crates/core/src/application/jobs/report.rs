// CRM summary report

use crate::application::job::JobLogic;
use crate::error::Result;
use crate::port::{CrmStats, StatsFetcher};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub struct ReportJob {
    fetcher: Arc<dyn StatsFetcher>,
}

impl ReportJob {
    pub fn new(fetcher: Arc<dyn StatsFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn format_summary(stats: &CrmStats) -> String {
        format!(
            "Report: {} customers, {} orders, {} revenue",
            stats.customer_count, stats.order_count, stats.total_revenue
        )
    }
}

#[async_trait]
impl JobLogic for ReportJob {
    async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
        let stats = self.fetcher.get_stats().await?;

        info!(
            customers = stats.customer_count,
            orders = stats.order_count,
            revenue = %stats.total_revenue,
            "Fetched CRM stats"
        );

        Ok(Self::format_summary(&stats))
    }
}
