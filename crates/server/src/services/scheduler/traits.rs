use async_trait::async_trait;
use std::time::Duration;

/// Result type for job execution
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A periodic background task managed by the scheduler.
#[async_trait]
pub trait SchedulerJob: Send + Sync {
    /// Job name, used for logging and manual triggering
    fn name(&self) -> &'static str;

    /// Interval between executions
    fn interval(&self) -> Duration;

    /// Execute one cycle of the job
    async fn execute(&self) -> JobResult;
}
