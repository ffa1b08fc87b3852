// Low-stock restock

use crate::application::job::JobLogic;
use crate::error::{AppError, Result};
use crate::port::{RestockPolicy, StockRestocker};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub struct LowStockJob {
    restocker: Arc<dyn StockRestocker>,
    policy: RestockPolicy,
}

impl LowStockJob {
    pub fn new(restocker: Arc<dyn StockRestocker>) -> Self {
        Self {
            restocker,
            policy: RestockPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RestockPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl JobLogic for LowStockJob {
    async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
        let outcome = self.restocker.restock_low_stock(self.policy).await?;

        if !outcome.success {
            return Err(AppError::Rejected(format!("Update failed: {}", outcome.message)));
        }

        info!(
            updated = outcome.updated_count,
            threshold = self.policy.threshold,
            message = %outcome.message,
            "Low-stock restock finished"
        );

        if outcome.updated_count > 0 {
            Ok(format!(
                "Successfully updated {} products with stock < {}",
                outcome.updated_count, self.policy.threshold
            ))
        } else {
            Ok(format!("No products with stock < {} found", self.policy.threshold))
        }
    }
}
