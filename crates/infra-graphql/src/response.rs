// GraphQL response decoding
//
// Pure functions over the raw response body so the wire contract can be
// tested without an HTTP server.

use crm_jobs_core::domain::Money;
use crm_jobs_core::port::{CrmStats, FetchError, RestockOutcome};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub(crate) const STATS_QUERY: &str = "{ customers { id } orders { id totalAmount } }";
pub(crate) const HELLO_QUERY: &str = "{ hello }";
pub(crate) const RESTOCK_MUTATION: &str =
    "mutation { updateLowStockProducts { success message updatedCount } }";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatsData {
    customers: Vec<Value>,
    orders: Vec<OrderNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    /// Null or absent for orders without a computed total
    #[serde(default)]
    total_amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct HelloData {
    hello: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockData {
    update_low_stock_products: RestockPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockPayload {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    updated_count: u64,
}

/// Decode the envelope, rejecting `errors` and a missing `data` member
fn extract_data<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| FetchError::Malformed(format!("invalid response body: {}", e)))?;

    if let Some(first) = envelope.errors.first() {
        return Err(FetchError::Malformed(format!(
            "GraphQL error: {}",
            first.message
        )));
    }

    envelope
        .data
        .ok_or_else(|| FetchError::Malformed("response has no data".to_string()))
}

/// `totalAmount` arrives as a decimal string or a JSON number. A null or
/// missing amount contributes nothing to revenue.
fn parse_amount(value: Option<&Value>) -> Result<Money, FetchError> {
    let text = match value {
        None | Some(Value::Null) => return Ok(Money::ZERO),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(FetchError::Malformed(format!(
                "totalAmount is not a decimal: {}",
                other
            )))
        }
    };

    text.parse::<Money>()
        .map_err(|e| FetchError::Malformed(e.to_string()))
}

pub fn parse_stats(body: &str) -> Result<CrmStats, FetchError> {
    let data: StatsData = extract_data(body)?;

    let amounts = data
        .orders
        .iter()
        .map(|order| parse_amount(order.total_amount.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let total_revenue =
        Money::try_sum(amounts).map_err(|e| FetchError::Malformed(e.to_string()))?;

    Ok(CrmStats {
        customer_count: data.customers.len() as u64,
        order_count: data.orders.len() as u64,
        total_revenue,
    })
}

pub fn parse_hello(body: &str) -> Result<String, FetchError> {
    let data: HelloData = extract_data(body)?;
    Ok(data.hello)
}

pub fn parse_restock(body: &str) -> Result<RestockOutcome, FetchError> {
    let data: RestockData = extract_data(body)?;
    let payload = data.update_low_stock_products;

    Ok(RestockOutcome {
        success: payload.success,
        message: payload.message,
        updated_count: payload.updated_count,
    })
}
