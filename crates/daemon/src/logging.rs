// Diagnostic logging setup (tracing-subscriber)

use crate::config::{LogFormat, Settings};
use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "crm_jobs=info";
const DIAGNOSTIC_FILE_PREFIX: &str = "crm-jobs.log";

/// Install the global subscriber.
///
/// The returned guard flushes the rolling file writer and must live until exit.
pub fn init(settings: &Settings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;

    let (writer, guard) = match settings.diagnostic_log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, DIAGNOSTIC_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    match settings.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .with(writer.map(file_layer))
            .try_init()
            .context("Failed to install JSON subscriber")?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .with(writer.map(file_layer))
            .try_init()
            .context("Failed to install pretty subscriber")?,
    }

    Ok(guard)
}

fn file_layer<S>(writer: NonBlocking) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer().json().with_ansi(false).with_writer(writer)
}
