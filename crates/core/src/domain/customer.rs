// Customer / Order Domain Model
//
// Owned by the data store. Jobs only read these shapes and request deletion
// by id.

use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order identifier
pub type OrderId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub created_at: DateTime<Utc>,
    pub orders: Vec<Order>,
}

impl Customer {
    pub fn new(id: CustomerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            orders: Vec::new(),
        }
    }

    pub fn has_orders(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Timestamp of the most recent order, `None` if the customer never ordered
    pub fn latest_order_at(&self) -> Option<DateTime<Utc>> {
        self.orders.iter().map(|o| o.placed_at).max()
    }

    /// Latest order strictly before `cutoff`. An order exactly at the cutoff
    /// keeps the customer active.
    pub fn has_stale_latest_order(&self, cutoff: DateTime<Utc>) -> bool {
        matches!(self.latest_order_at(), Some(latest) if latest < cutoff)
    }

    pub fn is_inactive(&self, cutoff: DateTime<Utc>) -> bool {
        !self.has_orders() || self.has_stale_latest_order(cutoff)
    }
}
