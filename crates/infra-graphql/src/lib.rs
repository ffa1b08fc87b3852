//! GraphQL adapters for CRM Jobs
//!
//! Talks to the CRM's GraphQL endpoint for aggregate stats, the heartbeat
//! greeting and the low-stock restock mutation.

mod client;
mod response;

pub use client::GraphqlClient;
pub use response::{parse_hello, parse_restock, parse_stats};
