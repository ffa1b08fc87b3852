// SQLite CustomerRepository / StatsFetcher / StockRestocker Implementation

use crate::map_sqlx_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_jobs_core::domain::{CustomerId, Money, OrderId};
use crm_jobs_core::error::Result;
use crm_jobs_core::port::{
    CrmStats, CustomerRepository, FetchError, RestockOutcome, RestockPolicy, StatsFetcher,
    StockRestocker,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Ids per DELETE statement (keeps well under SQLite's bind limit)
const DELETE_CHUNK: usize = 500;

pub struct SqliteCustomerRepository {
    pool: SqlitePool,
}

impl SqliteCustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_customer(
        &self,
        name: &str,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> Result<CustomerId> {
        let result = sqlx::query("INSERT INTO customers (name, email, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(created_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(CustomerId(result.last_insert_rowid()))
    }

    pub async fn insert_order(
        &self,
        customer_id: CustomerId,
        placed_at: DateTime<Utc>,
        total: Money,
    ) -> Result<OrderId> {
        let result =
            sqlx::query("INSERT INTO orders (customer_id, order_date, total_cents) VALUES (?, ?, ?)")
                .bind(customer_id.0)
                .bind(placed_at.timestamp_millis())
                .bind(total.cents())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_product(&self, name: &str, price: Money, stock: i64) -> Result<i64> {
        let result = sqlx::query("INSERT INTO products (name, price_cents, stock) VALUES (?, ?, ?)")
            .bind(name)
            .bind(price.cents())
            .bind(stock)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn product_stock(&self, product_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    pub async fn count_customers(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn query_stats(&self) -> Result<(i64, i64, i64)> {
        let customers = self.count_customers().await?;

        let (orders, revenue_cents): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM orders")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok((customers, orders, revenue_cents))
    }
}

fn to_ids(rows: Vec<i64>) -> BTreeSet<CustomerId> {
    rows.into_iter().map(CustomerId).collect()
}

fn count(name: &str, value: i64) -> std::result::Result<u64, FetchError> {
    u64::try_from(value).map_err(|_| FetchError::Malformed(format!("negative {}: {}", name, value)))
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepository {
    async fn list_customers_with_no_orders(&self) -> Result<BTreeSet<CustomerId>> {
        let rows: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT c.id FROM customers c
            WHERE NOT EXISTS (SELECT 1 FROM orders o WHERE o.customer_id = c.id)
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(to_ids(rows))
    }

    async fn list_customers_with_stale_latest_order(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<BTreeSet<CustomerId>> {
        // Per-customer latest order, strict comparison with the cutoff
        let rows: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT customer_id FROM orders
            GROUP BY customer_id
            HAVING MAX(order_date) < ?
            "#,
        )
        .bind(cutoff.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(to_ids(rows))
    }

    async fn delete_by_ids(&self, ids: &BTreeSet<CustomerId>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let all: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut deleted = 0u64;

        for chunk in all.chunks(DELETE_CHUNK) {
            // Orders first so the delete does not depend on the FK pragma
            let mut orders = QueryBuilder::<Sqlite>::new("DELETE FROM orders WHERE customer_id IN (");
            let mut separated = orders.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            orders
                .build()
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            let mut customers = QueryBuilder::<Sqlite>::new("DELETE FROM customers WHERE id IN (");
            let mut separated = customers.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
            let result = customers
                .build()
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            deleted += result.rows_affected();
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        info!(requested = ids.len(), deleted = deleted, "Deleted customers");
        Ok(deleted)
    }
}

#[async_trait]
impl StatsFetcher for SqliteCustomerRepository {
    async fn get_stats(&self) -> std::result::Result<CrmStats, FetchError> {
        let (customers, orders, revenue_cents) = self
            .query_stats()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(customers, orders, revenue_cents, "Aggregated CRM stats from SQLite");

        Ok(CrmStats {
            customer_count: count("customer count", customers)?,
            order_count: count("order count", orders)?,
            total_revenue: Money::from_cents(revenue_cents),
        })
    }
}

#[async_trait]
impl StockRestocker for SqliteCustomerRepository {
    async fn restock_low_stock(
        &self,
        policy: RestockPolicy,
    ) -> std::result::Result<RestockOutcome, FetchError> {
        let result = sqlx::query("UPDATE products SET stock = stock + ? WHERE stock < ?")
            .bind(policy.increment)
            .bind(policy.threshold)
            .execute(&self.pool)
            .await
            .map_err(|e| FetchError::Transport(map_sqlx_error(e).to_string()))?;

        let updated = result.rows_affected();
        Ok(RestockOutcome {
            success: true,
            message: format!("Restocked {} products", updated),
            updated_count: updated,
        })
    }
}
