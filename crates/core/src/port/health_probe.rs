// Health Probe Port (heartbeat)

use super::FetchError;
use async_trait::async_trait;

/// Liveness check against the CRM query endpoint
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns the endpoint's greeting on success
    async fn ping(&self) -> Result<String, FetchError>;
}

#[cfg(any(test, feature = "test-util"))]
pub mod mocks {
    use super::*;

    pub struct StaticHealthProbe {
        answer: Result<String, FetchError>,
    }

    impl StaticHealthProbe {
        pub fn healthy(reply: impl Into<String>) -> Self {
            Self {
                answer: Ok(reply.into()),
            }
        }

        pub fn failing(error: FetchError) -> Self {
            Self { answer: Err(error) }
        }
    }

    #[async_trait]
    impl HealthProbe for StaticHealthProbe {
        async fn ping(&self) -> Result<String, FetchError> {
            self.answer.clone()
        }
    }
}
