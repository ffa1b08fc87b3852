// Concrete CRM jobs and their default schedules

pub mod cleanup;
pub mod heartbeat;
pub mod low_stock;
pub mod report;

pub use cleanup::CleanupJob;
pub use heartbeat::HeartbeatJob;
pub use low_stock::LowStockJob;
pub use report::ReportJob;

use crate::domain::Recurrence;
use crate::error::Result;
use chrono::Weekday;

pub const CLEANUP_JOB: &str = "clean_inactive_customers";
pub const REPORT_JOB: &str = "generate_crm_report";
pub const HEARTBEAT_JOB: &str = "log_crm_heartbeat";
pub const LOW_STOCK_JOB: &str = "update_low_stock";

/// Every Sunday 02:00
pub fn cleanup_schedule() -> Result<Recurrence> {
    Ok(Recurrence::weekly(Weekday::Sun, 2, 0)?)
}

/// Every Monday 06:00
pub fn report_schedule() -> Result<Recurrence> {
    Ok(Recurrence::weekly(Weekday::Mon, 6, 0)?)
}

/// Every 5 minutes
pub fn heartbeat_schedule() -> Result<Recurrence> {
    Ok(Recurrence::every_minutes(5)?)
}

/// 00:00 and 12:00
pub fn low_stock_schedule() -> Result<Recurrence> {
    Ok(Recurrence::every_hours(12)?)
}
