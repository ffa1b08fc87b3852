//! CRM Jobs - scheduler daemon entry point

mod config;
mod logging;
mod wiring;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Settings;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "crm-jobs")]
#[command(about = "CRM background job scheduler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until Ctrl+C
    Start,

    /// Run one job immediately and print its log line
    Run {
        /// Job name (see `list`)
        name: String,
    },

    /// List registered jobs and their schedules
    List,

    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Held until exit so buffered diagnostics are flushed
    let _log_guard = logging::init(&cli.settings)?;

    match cli.command {
        Commands::Start => start(&cli.settings).await,
        Commands::Run { name } => run(&cli.settings, &name).await,
        Commands::List => list(&cli.settings).await,
        Commands::Migrate => migrate(&cli.settings).await,
    }
}

async fn start(settings: &Settings) -> Result<ExitCode> {
    info!("CRM Jobs v{} starting...", VERSION);

    let pool = wiring::open_database(settings).await?;
    let scheduler = Arc::new(wiring::build_scheduler(settings, pool)?);

    let mut runner = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.start().await })
    };

    info!("Press Ctrl+C to shutdown");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown signal received. Exiting gracefully...");
        }
        finished = &mut runner => {
            // Loop ended without a stop request
            finished.context("Scheduler task failed")??;
            return Ok(ExitCode::SUCCESS);
        }
    }

    scheduler.stop();

    match tokio::time::timeout(settings.shutdown_timeout(), runner).await {
        Ok(Ok(Ok(()))) => info!("Shutdown complete."),
        Ok(Ok(Err(e))) => error!(error = %e, "Scheduler stopped with error"),
        Ok(Err(e)) => error!(error = %e, "Scheduler task failed"),
        Err(_) => warn!(
            timeout_secs = settings.shutdown_timeout_secs,
            "Shutdown deadline elapsed, abandoning in-flight executions"
        ),
    }

    Ok(ExitCode::SUCCESS)
}

async fn run(settings: &Settings, name: &str) -> Result<ExitCode> {
    let pool = wiring::open_database(settings).await?;
    let scheduler = wiring::build_scheduler(settings, pool)?;

    let result = scheduler
        .run_now(name)
        .await
        .with_context(|| format!("Cannot run job {}", name))?;

    println!("{}", result.log_line());

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn list(settings: &Settings) -> Result<ExitCode> {
    let pool = wiring::open_database(settings).await?;
    let scheduler = wiring::build_scheduler(settings, pool)?;

    for (name, rule) in scheduler.schedules() {
        println!(
            "{:<28} {:<16} {}",
            name,
            rule.to_string(),
            settings.job_log_path(&name).display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn migrate(settings: &Settings) -> Result<ExitCode> {
    wiring::open_database(settings).await?;
    info!("Migrations applied");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_requires_job_name() {
        assert!(Cli::try_parse_from(["crm-jobs", "run"]).is_err());

        let cli = Cli::try_parse_from(["crm-jobs", "run", "generate_crm_report"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { name } if name == "generate_crm_report"));
    }

    #[test]
    fn test_global_settings_before_command() {
        let cli =
            Cli::try_parse_from(["crm-jobs", "--tick-secs", "1", "start"]).unwrap();
        assert!(matches!(cli.command, Commands::Start));
        assert_eq!(cli.settings.tick_secs, 1);
    }
}
