mod poll_job;
mod sweep_job;
mod traits;

pub use poll_job::FeedPollJob;
pub use sweep_job::RetentionSweepJob;
pub use traits::{JobResult, SchedulerJob};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Scheduler service that manages periodic background tasks.
///
/// The scheduler runs registered jobs at their specified intervals. Each job
/// runs independently in its own tokio task; a job's next tick is not
/// processed until the previous execution finished, and missed ticks are
/// skipped, so cycles of the same job never overlap.
///
/// # Example
///
/// ```rust,ignore
/// let scheduler = SchedulerService::new()
///     .with_job(FeedPollJob::new(acquisition, interval));
///
/// scheduler.start(shutdown_token);
/// ```
pub struct SchedulerService {
    jobs: Vec<Arc<dyn SchedulerJob>>,
}

impl SchedulerService {
    /// Creates a new scheduler service with no jobs.
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Adds a job to the scheduler.
    ///
    /// Jobs are not started until [`start`](Self::start) is called.
    pub fn with_job<J: SchedulerJob + 'static>(mut self, job: J) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    /// Adds an already-wrapped Arc job to the scheduler.
    ///
    /// This is useful when you need to keep a reference to the job for manual triggering.
    pub fn with_arc_job<J: SchedulerJob + 'static>(mut self, job: Arc<J>) -> Self {
        self.jobs.push(job);
        self
    }

    /// Starts all registered jobs.
    ///
    /// Each job runs in its own tokio task until the shutdown token is
    /// cancelled. This method returns immediately after spawning all tasks.
    pub fn start(&self, shutdown: CancellationToken) {
        for job in &self.jobs {
            let job = Arc::clone(job);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                Self::run_job_loop(job, shutdown).await;
            });
        }
    }

    /// Runs a single job in a loop until shutdown.
    async fn run_job_loop(job: Arc<dyn SchedulerJob>, shutdown: CancellationToken) {
        let name = job.name();
        let interval = job.interval();

        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {}
                _ = shutdown.cancelled() => {
                    tracing::info!("Job '{}' stopped", name);
                    break;
                }
            }

            match job.execute().await {
                Ok(()) => {
                    tracing::debug!("Job '{}' completed successfully", name);
                }
                Err(e) => {
                    tracing::error!("Job '{}' failed: {}", name, e);
                }
            }
        }
    }

    /// Returns the number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingJob {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SchedulerJob for CountingJob {
        fn name(&self) -> &'static str {
            "Counting"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        async fn execute(&self) -> JobResult {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn jobs_run_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = SchedulerService::new().with_job(CountingJob {
            runs: Arc::clone(&runs),
        });
        assert_eq!(scheduler.job_count(), 1);

        let shutdown = CancellationToken::new();
        scheduler.start(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        let after_cancel = runs.load(Ordering::SeqCst);
        assert!(after_cancel >= 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        // At most one in-flight tick after cancellation
        assert!(runs.load(Ordering::SeqCst) <= after_cancel + 1);
    }
}
