// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid monetary amount: {0}")]
    InvalidMoney(String),

    #[error("Monetary overflow while summing amounts")]
    MoneyOverflow,
}

pub type Result<T> = std::result::Result<T, DomainError>;
