// Daemon configuration: command-line flags with environment fallbacks

use clap::{Args, ValueEnum};
use crm_jobs_core::application::constants::{DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TICK_INTERVAL};
use crm_jobs_core::application::jobs::{CLEANUP_JOB, HEARTBEAT_JOB, LOW_STOCK_JOB, REPORT_JOB};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://crm.db";
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/graphql";
pub const DEFAULT_JOB_LOG_DIR: &str = "/tmp";

/// Where report and low-stock jobs read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsSource {
    Sqlite,
    Graphql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// SQLite database URL
    #[arg(long, env = "CRM_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Source of report and low-stock data
    #[arg(long, env = "CRM_STATS_SOURCE", value_enum, default_value = "sqlite")]
    pub stats_source: StatsSource,

    /// CRM GraphQL endpoint
    #[arg(long, env = "CRM_GRAPHQL_URL", default_value = DEFAULT_GRAPHQL_URL)]
    pub graphql_url: String,

    /// Directory of the per-job execution logs
    #[arg(long, env = "CRM_JOB_LOG_DIR", default_value = DEFAULT_JOB_LOG_DIR)]
    pub log_dir: String,

    /// Scheduler tick interval in seconds
    #[arg(long, env = "CRM_TICK_SECS", default_value_t = DEFAULT_TICK_INTERVAL.as_secs())]
    pub tick_secs: u64,

    /// Grace period for in-flight executions on shutdown
    #[arg(
        long,
        env = "CRM_SHUTDOWN_TIMEOUT_SECS",
        default_value_t = DEFAULT_SHUTDOWN_TIMEOUT.as_secs()
    )]
    pub shutdown_timeout_secs: u64,

    /// GraphQL request timeout in seconds
    #[arg(long, env = "CRM_HTTP_TIMEOUT_SECS", default_value = "10")]
    pub http_timeout_secs: u64,

    /// Diagnostic log format
    #[arg(long, env = "CRM_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Also write diagnostics to a daily rolling file in this directory
    #[arg(long, env = "CRM_DIAGNOSTIC_LOG_DIR")]
    pub diagnostic_log_dir: Option<String>,
}

impl Settings {
    /// Database URL with `~` expanded in the file path
    pub fn database_url(&self) -> String {
        match self.database_url.strip_prefix("sqlite://") {
            Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
            None => self.database_url.clone(),
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        expand_path(&self.log_dir)
    }

    pub fn diagnostic_log_dir(&self) -> Option<PathBuf> {
        self.diagnostic_log_dir.as_deref().map(expand_path)
    }

    pub fn job_log_path(&self, job: &str) -> PathBuf {
        self.log_dir().join(log_file_name(job))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Execution log file of a job
pub fn log_file_name(job: &str) -> String {
    match job {
        CLEANUP_JOB => "crm_cleanup_log.txt".to_string(),
        REPORT_JOB => "crm_report_log.txt".to_string(),
        HEARTBEAT_JOB => "crm_heartbeat_log.txt".to_string(),
        LOW_STOCK_JOB => "low_stock_updates_log.txt".to_string(),
        other => format!("{}_log.txt", other),
    }
}
