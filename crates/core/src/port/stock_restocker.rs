// Stock Restocker Port (low-stock maintenance)

use super::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Restock request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockPolicy {
    /// Products with stock strictly below this are restocked
    pub threshold: i64,
    /// Amount added to each low-stock product
    pub increment: i64,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            threshold: 10,
            increment: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockOutcome {
    pub success: bool,
    pub message: String,
    pub updated_count: u64,
}

#[async_trait]
pub trait StockRestocker: Send + Sync {
    async fn restock_low_stock(&self, policy: RestockPolicy) -> Result<RestockOutcome, FetchError>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    pub struct StaticRestocker {
        answer: Result<RestockOutcome, FetchError>,
        seen: Mutex<Vec<RestockPolicy>>,
    }

    impl StaticRestocker {
        pub fn updated(count: u64) -> Self {
            Self::new(Ok(RestockOutcome {
                success: true,
                message: format!("Updated {} products", count),
                updated_count: count,
            }))
        }

        pub fn rejected(message: impl Into<String>) -> Self {
            Self::new(Ok(RestockOutcome {
                success: false,
                message: message.into(),
                updated_count: 0,
            }))
        }

        pub fn new(answer: Result<RestockOutcome, FetchError>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn policies_seen(&self) -> Vec<RestockPolicy> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StockRestocker for StaticRestocker {
        async fn restock_low_stock(
            &self,
            policy: RestockPolicy,
        ) -> Result<RestockOutcome, FetchError> {
            self.seen.lock().unwrap().push(policy);
            self.answer.clone()
        }
    }
}
