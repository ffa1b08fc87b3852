//! Scheduler - triggers registered jobs at their due minutes
//!
//! - A job is due when its rule matched a minute since the previous pass
//!   (bounded by `MAX_CATCH_UP_MINUTES`) and it has not been dispatched for
//!   that minute yet. A late pass dispatches the latest missed minute once.
//! - Each execution runs on its own task; a per-job in-flight lock keeps one
//!   execution per job at a time. A due job that is still running is skipped
//!   for that tick, not queued.
//! - Errors and panics inside a job become Failure results and are appended to
//!   the job's log sink; they never reach the scheduling loop.

use crate::application::constants::{
    DEFAULT_TICK_INTERVAL, MAX_CATCH_UP_MINUTES, MIN_TICK_INTERVAL,
};
use crate::application::job::JobDefinition;
use crate::application::panic_guard::panic_message;
use crate::application::shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
use crate::domain::{minute_floor, JobResult, Recurrence};
use crate::error::{AppError, Result};
use crate::port::TimeProvider;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Registered job plus the state the scheduler keeps for it
struct JobSlot {
    definition: JobDefinition,
    /// Minute of the last scheduled dispatch
    last_run: Mutex<Option<DateTime<Utc>>>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

pub struct Scheduler {
    jobs: RwLock<BTreeMap<String, Arc<JobSlot>>>,
    time_provider: Arc<dyn TimeProvider>,
    tick_interval: Duration,
    /// Minute evaluated by the previous pass
    last_pass: Mutex<Option<DateTime<Utc>>>,
    shutdown_tx: ShutdownSender,
    shutdown_rx: ShutdownToken,
}

impl Scheduler {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        Self {
            jobs: RwLock::new(BTreeMap::new()),
            time_provider,
            tick_interval: DEFAULT_TICK_INTERVAL,
            last_pass: Mutex::new(None),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Interval between scheduling passes
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Register a job. Fails if a job with the same name exists.
    pub fn register(&self, definition: JobDefinition) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());

        if jobs.contains_key(&definition.name) {
            return Err(AppError::DuplicateJob(definition.name));
        }

        info!(
            job = %definition.name,
            schedule = %definition.recurrence,
            "Job registered"
        );

        jobs.insert(
            definition.name.clone(),
            Arc::new(JobSlot {
                definition,
                last_run: Mutex::new(None),
                in_flight: Arc::new(tokio::sync::Mutex::new(())),
            }),
        );
        Ok(())
    }

    /// Registered job names with their rules, ordered by name
    pub fn schedules(&self) -> Vec<(String, Recurrence)> {
        self.slots()
            .iter()
            .map(|s| (s.definition.name.clone(), s.definition.recurrence))
            .collect()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.schedules().into_iter().map(|(name, _)| name).collect()
    }

    /// Run the scheduling loop until `stop` is called.
    ///
    /// Returns after every execution dispatched by the loop has finished.
    pub async fn start(&self) -> Result<()> {
        let mut shutdown = self.shutdown_rx.clone();
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight: Vec<JoinHandle<JobResult>> = Vec::new();

        info!(
            jobs = self.slots().len(),
            tick_secs = self.tick_interval.as_secs_f64(),
            "Scheduler started"
        );

        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    in_flight.retain(|h| !h.is_finished());
                    in_flight.extend(self.tick());
                }
                _ = shutdown.wait() => break,
            }
        }

        in_flight.retain(|h| !h.is_finished());
        info!(
            in_flight = in_flight.len(),
            "Scheduler stopping, waiting for in-flight executions"
        );

        for handle in in_flight {
            if let Err(e) = handle.await {
                warn!(error = %e, "In-flight execution did not complete");
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Request loop termination. Idempotent.
    pub fn stop(&self) {
        if !self.shutdown_rx.is_shutdown() {
            info!("Scheduler stop requested");
        }
        self.shutdown_tx.shutdown();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown_rx.is_shutdown()
    }

    /// One scheduling pass: dispatch every due job that is not in flight.
    ///
    /// Must be called inside a tokio runtime. Returns the handles of the
    /// executions started by this pass.
    pub fn tick(&self) -> Vec<JoinHandle<JobResult>> {
        let now = self.time_provider.now();
        let minute = minute_floor(&now);
        let window_start = self.begin_pass(minute);
        let mut handles = Vec::new();

        for slot in self.slots() {
            let name = &slot.definition.name;

            let Some(due) = latest_due(&slot.definition.recurrence, window_start, minute) else {
                continue;
            };

            if *slot.last_run.lock().unwrap_or_else(|e| e.into_inner()) == Some(due) {
                debug!(job = %name, minute = %due, "Already dispatched for this minute");
                continue;
            }

            let guard = match Arc::clone(&slot.in_flight).try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    warn!(job = %name, "Previous execution still running, skipping this tick");
                    continue;
                }
            };

            *slot.last_run.lock().unwrap_or_else(|e| e.into_inner()) = Some(due);

            if due == minute {
                info!(job = %name, minute = %due, "Dispatching due job");
            } else {
                warn!(job = %name, minute = %due, now = %now, "Dispatching job for a minute the previous pass missed");
            }

            let slot = Arc::clone(&slot);
            let time_provider = Arc::clone(&self.time_provider);
            handles.push(tokio::spawn(async move {
                let _guard = guard;
                execute_definition(&slot.definition, &time_provider).await
            }));
        }

        handles
    }

    /// Run one job immediately, outside its schedule.
    ///
    /// Waits for an in-flight execution of the same job to finish first.
    pub async fn run_now(&self, name: &str) -> Result<JobResult> {
        let slot = self
            .slot(name)
            .ok_or_else(|| AppError::JobNotFound(name.to_string()))?;

        let _guard = slot.in_flight.lock().await;
        info!(job = %name, "Running job on demand");

        Ok(execute_definition(&slot.definition, &self.time_provider).await)
    }

    /// Record `minute` as evaluated and return the exclusive start of the
    /// window this pass covers. The first pass, a repeated minute and a clock
    /// that moved backwards all cover the current minute only.
    fn begin_pass(&self, minute: DateTime<Utc>) -> DateTime<Utc> {
        let previous = self
            .last_pass
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(minute);

        match previous {
            Some(prev) if prev < minute => {
                prev.max(minute - chrono::Duration::minutes(MAX_CATCH_UP_MINUTES))
            }
            _ => minute - chrono::Duration::minutes(1),
        }
    }

    fn slots(&self) -> Vec<Arc<JobSlot>> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn slot(&self, name: &str) -> Option<Arc<JobSlot>> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }
}

/// Latest minute in `(after, until]` the rule matches
fn latest_due(
    recurrence: &Recurrence,
    after: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut due = None;
    let mut cursor = after;
    while let Some(next) = recurrence.next_after(&cursor) {
        if next > until {
            break;
        }
        due = Some(next);
        cursor = next;
    }
    due
}

/// Execute a job and append its result to the job's sink.
///
/// The logic runs on its own task so a panic is observed as a `JoinError`
/// instead of unwinding through the caller.
async fn execute_definition(
    definition: &JobDefinition,
    time_provider: &Arc<dyn TimeProvider>,
) -> JobResult {
    let name = definition.name.as_str();
    let started_at = time_provider.now();
    let logic = Arc::clone(&definition.logic);

    let outcome = tokio::task::spawn(async move { logic.execute(started_at).await }).await;
    let finished_at = time_provider.now();

    let result = match outcome {
        Ok(Ok(summary)) => JobResult::success(name, started_at, finished_at, summary),
        Ok(Err(e)) => {
            error!(job = %name, error = %e, "Job failed");
            JobResult::failure(name, started_at, finished_at, e.to_string())
        }
        Err(join_err) => {
            let reason = if join_err.is_panic() {
                format!("job panicked: {}", panic_message(join_err.into_panic()))
            } else {
                "job cancelled".to_string()
            };
            error!(job = %name, error = %reason, "Job aborted");
            JobResult::failure(name, started_at, finished_at, reason)
        }
    };

    info!(
        job = %name,
        success = result.is_success(),
        duration_ms = result.duration_ms(),
        summary = %result.summary(),
        "Job finished"
    );

    if let Err(e) = definition.sink.append(&result).await {
        // Diagnostic channel only: the outcome stands
        error!(job = %name, error = %e, line = %result.log_line(), "Failed to append execution log line");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::job::JobLogic;
    use crate::application::jobs::{cleanup_schedule, report_schedule, CleanupJob, ReportJob};
    use crate::domain::{JobOutcome, Money};
    use crate::port::customer_repository::mocks::FixedSetsRepository;
    use crate::port::log_sink::mocks::{FailingLogSink, MemoryLogSink};
    use crate::port::stats_fetcher::mocks::StaticStatsFetcher;
    use crate::port::time_provider::mocks::ManualClock;
    use crate::port::{FetchError, LogSink};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::task::Poll;
    use tokio::sync::Notify;
    use tokio_test::{assert_pending, task};

    struct SummaryJob(&'static str);

    #[async_trait]
    impl JobLogic for SummaryJob {
        async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct PanickingJob;

    #[async_trait]
    impl JobLogic for PanickingJob {
        async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
            panic!("repository handle poisoned");
        }
    }

    /// Blocks until released, tracking concurrent executions
    #[derive(Default)]
    struct GatedJob {
        gate: Notify,
        running: AtomicUsize,
        max_running: AtomicUsize,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl JobLogic for GatedJob {
        async fn execute(&self, _now: DateTime<Utc>) -> Result<String> {
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(running, Ordering::SeqCst);
            self.gate.notified().await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok("gated".to_string())
        }
    }

    /// Wall clock driven by tokio's (pausable) clock, plus a settable skew
    struct TokioClock {
        base: DateTime<Utc>,
        origin: tokio::time::Instant,
        skew_ms: AtomicI64,
    }

    impl TokioClock {
        fn new(base: DateTime<Utc>) -> Self {
            Self {
                base,
                origin: tokio::time::Instant::now(),
                skew_ms: AtomicI64::new(0),
            }
        }

        fn skew(&self, ms: i64) {
            self.skew_ms.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl TimeProvider for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap();
            self.base + elapsed + chrono::Duration::milliseconds(self.skew_ms.load(Ordering::SeqCst))
        }
    }

    // 2024-06-02 is a Sunday, 2024-06-03 a Monday
    fn sunday_2am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 2, 0, 0).unwrap()
    }

    fn monday_6am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 6, 0, 0).unwrap()
    }

    fn every_minute() -> Recurrence {
        Recurrence::every_minutes(1).unwrap()
    }

    fn definition(
        name: &str,
        recurrence: Recurrence,
        logic: Arc<dyn JobLogic>,
        sink: Arc<dyn LogSink>,
    ) -> JobDefinition {
        JobDefinition::new(name, recurrence, logic, sink)
    }

    async fn join_all(handles: Vec<JoinHandle<JobResult>>) -> Vec<JobResult> {
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        results
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let scheduler = Scheduler::new(Arc::new(ManualClock::new(sunday_2am())));
        let sink = Arc::new(MemoryLogSink::new());

        scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), sink.clone()))
            .unwrap();
        let err = scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), sink))
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateJob(ref n) if n == "a"));
        assert_eq!(scheduler.job_names(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_run_now_unknown_job() {
        let scheduler = Scheduler::new(Arc::new(ManualClock::new(sunday_2am())));
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), sink.clone()))
            .unwrap();

        let err = scheduler.run_now("unknown").await.unwrap_err();

        assert!(matches!(err, AppError::JobNotFound(ref n) if n == "unknown"));
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_run_now_ignores_schedule() {
        // Monday: cleanup rule does not match, run_now still runs it
        let clock = Arc::new(ManualClock::new(monday_6am()));
        let scheduler = Scheduler::new(clock);
        let sink = Arc::new(MemoryLogSink::new());
        let repo = Arc::new(FixedSetsRepository::new(&[1, 2], &[2, 3]));
        scheduler
            .register(definition(
                "cleanup",
                cleanup_schedule().unwrap(),
                Arc::new(CleanupJob::new(repo)),
                sink.clone(),
            ))
            .unwrap();

        let result = scheduler.run_now("cleanup").await.unwrap();

        assert!(result.is_success());
        assert_eq!(
            sink.lines(),
            vec!["2024-06-03 06:00:00 - Successfully deleted 3 inactive customers".to_string()]
        );
    }

    #[tokio::test]
    async fn test_tick_dispatches_only_matching_jobs_once_per_minute() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Scheduler::new(clock.clone());
        let cleanup_sink = Arc::new(MemoryLogSink::new());
        let report_sink = Arc::new(MemoryLogSink::new());

        scheduler
            .register(definition(
                "cleanup",
                cleanup_schedule().unwrap(),
                Arc::new(CleanupJob::new(Arc::new(FixedSetsRepository::new(&[], &[])))),
                cleanup_sink.clone(),
            ))
            .unwrap();
        scheduler
            .register(definition(
                "report",
                report_schedule().unwrap(),
                Arc::new(ReportJob::new(Arc::new(StaticStatsFetcher::new(1, 1, Money::ZERO)))),
                report_sink.clone(),
            ))
            .unwrap();

        let results = join_all(scheduler.tick()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_name, "cleanup");

        // Same minute again: nothing new
        clock.advance(chrono::Duration::seconds(30));
        assert!(scheduler.tick().is_empty());

        // Next minute: rule no longer matches
        clock.advance(chrono::Duration::seconds(30));
        assert!(scheduler.tick().is_empty());

        // Monday 06:00: report only
        clock.set(monday_6am());
        let results = join_all(scheduler.tick()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_name, "report");

        // A week later cleanup is due again
        clock.set(sunday_2am() + chrono::Duration::days(7));
        assert_eq!(join_all(scheduler.tick()).await.len(), 1);

        assert_eq!(cleanup_sink.lines().len(), 2);
        assert_eq!(
            report_sink.lines(),
            vec!["2024-06-03 06:00:00 - Report: 1 customers, 1 orders, 0.00 revenue".to_string()]
        );
    }

    #[tokio::test]
    async fn test_in_flight_job_is_skipped_not_queued() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Scheduler::new(clock.clone());
        let sink = Arc::new(MemoryLogSink::new());
        let job = Arc::new(GatedJob::default());
        scheduler
            .register(definition("slow", every_minute(), job.clone(), sink.clone()))
            .unwrap();

        let first = scheduler.tick();
        assert_eq!(first.len(), 1);

        // Wait until the execution is actually running
        while job.running.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Next due minute while still running: skipped
        clock.advance(chrono::Duration::minutes(1));
        assert!(scheduler.tick().is_empty());

        job.gate.notify_one();
        join_all(first).await;

        // The skipped minute is reconsidered on the next tick
        let again = scheduler.tick();
        assert_eq!(again.len(), 1);
        job.gate.notify_one();
        join_all(again).await;

        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
        assert_eq!(job.max_running.load(Ordering::SeqCst), 1);
        assert_eq!(sink.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_late_tick_dispatches_the_minute_it_passed_over() {
        let clock = Arc::new(ManualClock::new(sunday_2am() - chrono::Duration::milliseconds(10)));
        let scheduler = Scheduler::new(clock.clone());
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition(
                "cleanup",
                cleanup_schedule().unwrap(),
                Arc::new(CleanupJob::new(Arc::new(FixedSetsRepository::new(&[], &[])))),
                sink.clone(),
            ))
            .unwrap();

        // 01:59:59.990: not due yet
        assert!(scheduler.tick().is_empty());

        // Next pass lands at 02:01:00.010, past the 02:00 minute
        clock.set(sunday_2am() + chrono::Duration::milliseconds(60_010));
        let results = join_all(scheduler.tick()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_name, "cleanup");

        // Caught-up minute is not dispatched twice
        clock.advance(chrono::Duration::minutes(1));
        assert!(scheduler.tick().is_empty());

        assert_eq!(
            sink.lines(),
            vec!["2024-06-02 02:01:00 - No inactive customers found to delete".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missed_minutes_collapse_into_one_dispatch() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Scheduler::new(clock.clone());
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), sink.clone()))
            .unwrap();

        assert_eq!(join_all(scheduler.tick()).await.len(), 1);

        // Five minutes without a pass: one execution, not five
        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(join_all(scheduler.tick()).await.len(), 1);
        assert_eq!(sink.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_catch_up_is_bounded() {
        // Saturday 00:00, then nothing until Tuesday 00:00
        let saturday = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(saturday));
        let scheduler = Scheduler::new(clock.clone());
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition(
                "cleanup",
                cleanup_schedule().unwrap(),
                Arc::new(CleanupJob::new(Arc::new(FixedSetsRepository::new(&[], &[])))),
                sink.clone(),
            ))
            .unwrap();

        assert!(scheduler.tick().is_empty());

        // Sunday 02:00 is older than the catch-up window
        clock.set(saturday + chrono::Duration::days(3));
        assert!(scheduler.tick().is_empty());
        assert!(sink.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_catches_up_when_a_tick_slips_past_the_minute() {
        let clock = Arc::new(TokioClock::new(sunday_2am() - chrono::Duration::milliseconds(10)));
        let scheduler = Arc::new(Scheduler::new(clock.clone()));
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition(
                "cleanup",
                cleanup_schedule().unwrap(),
                Arc::new(SummaryJob("swept")),
                sink.clone(),
            ))
            .unwrap();
        assert_eq!(scheduler.tick_interval(), DEFAULT_TICK_INTERVAL);

        let runner = Arc::clone(&scheduler);
        let handle = tokio::spawn(async move { runner.start().await });

        // First pass runs at 01:59:59.990, then the wall clock drifts 20ms
        tokio::time::sleep(Duration::from_millis(1)).await;
        clock.skew(20);

        tokio::time::sleep(Duration::from_secs(600)).await;
        scheduler.stop();
        handle.await.unwrap().unwrap();

        assert_eq!(sink.lines(), vec!["2024-06-02 02:01:00 - swept".to_string()]);
    }

    #[tokio::test]
    async fn test_run_now_waits_for_in_flight_tick_execution() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Scheduler::new(clock.clone());
        let sink = Arc::new(MemoryLogSink::new());
        let job = Arc::new(GatedJob::default());
        scheduler
            .register(definition("slow", every_minute(), job.clone(), sink.clone()))
            .unwrap();

        let dispatched = scheduler.tick();
        assert_eq!(dispatched.len(), 1);
        while job.running.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        clock.advance(chrono::Duration::seconds(30));
        let mut on_demand = task::spawn(scheduler.run_now("slow"));
        assert_pending!(on_demand.poll());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_pending!(on_demand.poll());
        assert_eq!(job.running.load(Ordering::SeqCst), 1);

        job.gate.notify_one();
        join_all(dispatched).await;
        assert!(on_demand.is_woken());

        job.gate.notify_one();
        let result = loop {
            if let Poll::Ready(result) = on_demand.poll() {
                break result.unwrap();
            }
            tokio::task::yield_now().await;
        };

        assert!(result.is_success());
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
        assert_eq!(job.max_running.load(Ordering::SeqCst), 1);
        assert_eq!(
            sink.lines(),
            vec![
                "2024-06-02 02:00:00 - gated".to_string(),
                "2024-06-02 02:00:30 - gated".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_is_logged_and_other_jobs_still_run() {
        let clock = Arc::new(ManualClock::new(monday_6am()));
        let scheduler = Scheduler::new(clock);
        let report_sink = Arc::new(MemoryLogSink::new());
        let other_sink = Arc::new(MemoryLogSink::new());

        scheduler
            .register(definition(
                "report",
                report_schedule().unwrap(),
                Arc::new(ReportJob::new(Arc::new(StaticStatsFetcher::failing(
                    FetchError::Transport("connection refused".to_string()),
                )))),
                report_sink.clone(),
            ))
            .unwrap();
        scheduler
            .register(definition("other", every_minute(), Arc::new(SummaryJob("fine")), other_sink.clone()))
            .unwrap();

        let results = join_all(scheduler.tick()).await;
        assert_eq!(results.len(), 2);

        let report = results.iter().find(|r| r.job_name == "report").unwrap();
        assert!(matches!(report.outcome, JobOutcome::Failure { .. }));
        assert_eq!(
            report_sink.lines(),
            vec!["2024-06-03 06:00:00 - ERROR: Fetch error: Transport error: connection refused".to_string()]
        );
        assert_eq!(other_sink.lines(), vec!["2024-06-03 06:00:00 - fine".to_string()]);
    }

    #[tokio::test]
    async fn test_panicking_job_becomes_failure() {
        let scheduler = Scheduler::new(Arc::new(ManualClock::new(sunday_2am())));
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition("boom", every_minute(), Arc::new(PanickingJob), sink.clone()))
            .unwrap();

        let result = scheduler.run_now("boom").await.unwrap();

        assert_eq!(
            result.outcome,
            JobOutcome::Failure {
                error: "job panicked: repository handle poisoned".to_string()
            }
        );
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.lines()[0].contains("ERROR: job panicked"));
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_flip_success() {
        let scheduler = Scheduler::new(Arc::new(ManualClock::new(sunday_2am())));
        scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), Arc::new(FailingLogSink)))
            .unwrap();

        let result = scheduler.run_now("a").await.unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Arc::new(Scheduler::new(clock).with_tick_interval(Duration::from_millis(1)));
        let sink = Arc::new(MemoryLogSink::new());
        scheduler
            .register(definition("a", every_minute(), Arc::new(SummaryJob("ok")), sink.clone()))
            .unwrap();

        let runner = Arc::clone(&scheduler);
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.lines().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        scheduler.stop();
        scheduler.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // The manual clock never left the minute: exactly one dispatch
        assert_eq!(sink.lines().len(), 1);
        assert!(scheduler.is_stopped());
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_execution() {
        let clock = Arc::new(ManualClock::new(sunday_2am()));
        let scheduler = Arc::new(Scheduler::new(clock).with_tick_interval(Duration::from_millis(1)));
        let sink = Arc::new(MemoryLogSink::new());
        let job = Arc::new(GatedJob::default());
        scheduler
            .register(definition("slow", every_minute(), job.clone(), sink.clone()))
            .unwrap();

        let runner = Arc::clone(&scheduler);
        let handle = tokio::spawn(async move { runner.start().await });

        tokio::time::timeout(Duration::from_secs(5), async {
            while job.running.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished(), "start returned before the job finished");

        job.gate.notify_one();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(sink.lines(), vec!["2024-06-02 02:00:00 - gated".to_string()]);
    }
}
