// Port Layer - Interfaces for external dependencies

pub mod customer_repository;
pub mod health_probe; // heartbeat
pub mod log_sink;
pub mod stats_fetcher;
pub mod stock_restocker; // low-stock maintenance
pub mod time_provider;

// Re-exports
pub use customer_repository::CustomerRepository;
pub use health_probe::HealthProbe;
pub use log_sink::{LogSink, LogSinkError};
pub use stats_fetcher::{CrmStats, FetchError, StatsFetcher};
pub use stock_restocker::{RestockOutcome, RestockPolicy, StockRestocker};
pub use time_provider::TimeProvider;
