// Domain Layer - Pure business logic and entities

pub mod customer;
pub mod error;
pub mod job_result;
pub mod money;
pub mod recurrence;

// Re-exports
pub use customer::{Customer, CustomerId, Order, OrderId};
pub use error::DomainError;
pub use job_result::{JobOutcome, JobResult, LOG_TIMESTAMP_FORMAT};
pub use money::Money;
pub use recurrence::{minute_floor, Field, Recurrence, WeekdayField};
