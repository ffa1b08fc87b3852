// Dependency wiring (composition root)

use crate::config::{Settings, StatsSource};
use anyhow::{Context, Result};
use crm_jobs_core::application::jobs::{
    cleanup_schedule, heartbeat_schedule, low_stock_schedule, report_schedule, CleanupJob,
    HeartbeatJob, LowStockJob, ReportJob, CLEANUP_JOB, HEARTBEAT_JOB, LOW_STOCK_JOB, REPORT_JOB,
};
use crm_jobs_core::application::{JobDefinition, JobLogic, Scheduler};
use crm_jobs_core::domain::Recurrence;
use crm_jobs_core::port::time_provider::SystemTimeProvider;
use crm_jobs_core::port::{LogSink, StatsFetcher, StockRestocker};
use crm_jobs_infra_graphql::GraphqlClient;
use crm_jobs_infra_sqlite::{create_pool, run_migrations, SqliteCustomerRepository, SqlitePool};
use crm_jobs_infra_system::FileLogSink;
use std::sync::Arc;
use tracing::info;

/// Open the database and bring the schema up to date
pub async fn open_database(settings: &Settings) -> Result<SqlitePool> {
    let url = settings.database_url();
    info!(database_url = %url, "Initializing database...");

    let pool = create_pool(&url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    Ok(pool)
}

/// Build a scheduler with the four CRM jobs registered
pub fn build_scheduler(settings: &Settings, pool: SqlitePool) -> Result<Scheduler> {
    let repository = Arc::new(SqliteCustomerRepository::new(pool));
    let graphql = Arc::new(
        GraphqlClient::new(settings.graphql_url.clone(), settings.http_timeout())
            .context("GraphQL client creation failed")?,
    );

    let (stats, restocker) = match settings.stats_source {
        StatsSource::Sqlite => (
            repository.clone() as Arc<dyn StatsFetcher>,
            repository.clone() as Arc<dyn StockRestocker>,
        ),
        StatsSource::Graphql => (
            graphql.clone() as Arc<dyn StatsFetcher>,
            graphql.clone() as Arc<dyn StockRestocker>,
        ),
    };

    let scheduler =
        Scheduler::new(Arc::new(SystemTimeProvider)).with_tick_interval(settings.tick_interval());

    let jobs: Vec<(&str, Recurrence, Arc<dyn JobLogic>)> = vec![
        (
            CLEANUP_JOB,
            cleanup_schedule()?,
            Arc::new(CleanupJob::new(repository)) as Arc<dyn JobLogic>,
        ),
        (
            REPORT_JOB,
            report_schedule()?,
            Arc::new(ReportJob::new(stats)) as Arc<dyn JobLogic>,
        ),
        (
            HEARTBEAT_JOB,
            heartbeat_schedule()?,
            Arc::new(HeartbeatJob::new(graphql)) as Arc<dyn JobLogic>,
        ),
        (
            LOW_STOCK_JOB,
            low_stock_schedule()?,
            Arc::new(LowStockJob::new(restocker)) as Arc<dyn JobLogic>,
        ),
    ];

    for (name, recurrence, logic) in jobs {
        let sink: Arc<dyn LogSink> = Arc::new(FileLogSink::new(settings.job_log_path(name)));
        scheduler
            .register(JobDefinition::new(name, recurrence, logic, sink))
            .with_context(|| format!("Failed to register job {}", name))?;
    }

    info!(
        stats_source = ?settings.stats_source,
        log_dir = %settings.log_dir().display(),
        "Jobs registered"
    );

    Ok(scheduler)
}
