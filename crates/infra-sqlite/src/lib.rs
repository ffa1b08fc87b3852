// CRM Jobs Infrastructure - SQLite Adapter
// Implements: CustomerRepository, StatsFetcher, StockRestocker

mod connection;
mod customer_repository;
mod error;
mod migration;

pub use connection::create_pool;
pub use customer_repository::SqliteCustomerRepository;
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use sqlx::SqlitePool;
