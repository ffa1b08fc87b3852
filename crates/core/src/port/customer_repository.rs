// Customer Repository Port (Interface)

use crate::domain::CustomerId;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Narrow read/delete access to customers and their orders
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Customers that never placed an order
    async fn list_customers_with_no_orders(&self) -> Result<BTreeSet<CustomerId>>;

    /// Customers whose most recent order is strictly before `cutoff`.
    /// Customers without orders are not included.
    async fn list_customers_with_stale_latest_order(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<BTreeSet<CustomerId>>;

    /// Delete customers (and their orders); returns the number actually deleted
    async fn delete_by_ids(&self, ids: &BTreeSet<CustomerId>) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "test-util"))]
pub mod mocks {
    use super::*;
    use crate::domain::{Customer, Money, Order};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store computing both sets from the customer records
    #[derive(Default)]
    pub struct InMemoryCustomerRepository {
        customers: Mutex<BTreeMap<CustomerId, Customer>>,
        next_order_id: Mutex<i64>,
    }

    impl InMemoryCustomerRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_customer(&self, id: i64, created_at: DateTime<Utc>) {
            self.customers
                .lock()
                .unwrap()
                .insert(CustomerId(id), Customer::new(CustomerId(id), created_at));
        }

        pub fn add_order(&self, customer: i64, placed_at: DateTime<Utc>, total: Money) {
            let id = {
                let mut next = self.next_order_id.lock().unwrap();
                *next += 1;
                *next
            };
            if let Some(c) = self.customers.lock().unwrap().get_mut(&CustomerId(customer)) {
                c.orders.push(Order {
                    id,
                    customer_id: CustomerId(customer),
                    placed_at,
                    total,
                });
            }
        }

        pub fn customer_ids(&self) -> BTreeSet<CustomerId> {
            self.customers.lock().unwrap().keys().copied().collect()
        }
    }

    #[async_trait]
    impl CustomerRepository for InMemoryCustomerRepository {
        async fn list_customers_with_no_orders(&self) -> Result<BTreeSet<CustomerId>> {
            Ok(self
                .customers
                .lock()
                .unwrap()
                .values()
                .filter(|c| !c.has_orders())
                .map(|c| c.id)
                .collect())
        }

        async fn list_customers_with_stale_latest_order(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<BTreeSet<CustomerId>> {
            Ok(self
                .customers
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.has_stale_latest_order(cutoff))
                .map(|c| c.id)
                .collect())
        }

        async fn delete_by_ids(&self, ids: &BTreeSet<CustomerId>) -> Result<u64> {
            let mut customers = self.customers.lock().unwrap();
            let deleted = ids.iter().filter(|id| customers.remove(*id).is_some()).count();
            Ok(deleted as u64)
        }
    }

    /// Repository answering with fixed sets and recording deletions
    pub struct FixedSetsRepository {
        no_orders: BTreeSet<CustomerId>,
        stale: BTreeSet<CustomerId>,
        reported_deleted: Option<u64>,
        deletions: Mutex<Vec<BTreeSet<CustomerId>>>,
    }

    impl FixedSetsRepository {
        pub fn new(no_orders: &[i64], stale: &[i64]) -> Self {
            Self {
                no_orders: no_orders.iter().map(|i| CustomerId(*i)).collect(),
                stale: stale.iter().map(|i| CustomerId(*i)).collect(),
                reported_deleted: None,
                deletions: Mutex::new(Vec::new()),
            }
        }

        /// Report a different deleted count than requested (concurrent modification)
        pub fn reporting_deleted(mut self, count: u64) -> Self {
            self.reported_deleted = Some(count);
            self
        }

        pub fn deletions(&self) -> Vec<BTreeSet<CustomerId>> {
            self.deletions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CustomerRepository for FixedSetsRepository {
        async fn list_customers_with_no_orders(&self) -> Result<BTreeSet<CustomerId>> {
            Ok(self.no_orders.clone())
        }

        async fn list_customers_with_stale_latest_order(
            &self,
            _cutoff: DateTime<Utc>,
        ) -> Result<BTreeSet<CustomerId>> {
            Ok(self.stale.clone())
        }

        async fn delete_by_ids(&self, ids: &BTreeSet<CustomerId>) -> Result<u64> {
            self.deletions.lock().unwrap().push(ids.clone());
            Ok(self.reported_deleted.unwrap_or(ids.len() as u64))
        }
    }
}
