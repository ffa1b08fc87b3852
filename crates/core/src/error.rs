// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Job already registered: {0}")]
    DuplicateJob(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::port::FetchError),

    /// Remote side answered but refused the operation
    #[error("{0}")]
    Rejected(String),

    #[error("Log sink error: {0}")]
    LogSink(#[from] crate::port::LogSinkError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
