// CRM Jobs Infrastructure - System Adapters
// Implements: LogSink

pub mod file_log_sink;

pub use file_log_sink::FileLogSink;
