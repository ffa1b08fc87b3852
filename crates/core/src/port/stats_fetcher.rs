// Stats Fetcher Port
// Aggregate CRM figures from a query interface (local DB or GraphQL endpoint)

use crate::domain::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Aggregate counts and revenue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmStats {
    pub customer_count: u64,
    pub order_count: u64,
    pub total_revenue: Money,
}

/// Errors raised while talking to a query interface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    /// Retrieve customer count, order count and total revenue
    ///
    /// # Errors
    /// - FetchError::Transport if the endpoint is unreachable
    /// - FetchError::Timeout if the request exceeds its deadline
    /// - FetchError::Malformed if the response does not match the schema
    async fn get_stats(&self) -> Result<CrmStats, FetchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "test-util"))]
pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher returning a canned answer
    pub struct StaticStatsFetcher {
        answer: Result<CrmStats, FetchError>,
        calls: AtomicUsize,
    }

    impl StaticStatsFetcher {
        pub fn new(customer_count: u64, order_count: u64, total_revenue: Money) -> Self {
            Self {
                answer: Ok(CrmStats {
                    customer_count,
                    order_count,
                    total_revenue,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self {
                answer: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsFetcher for StaticStatsFetcher {
        async fn get_stats(&self) -> Result<CrmStats, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }
}
