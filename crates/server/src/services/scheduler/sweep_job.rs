use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{JobResult, SchedulerJob};
use crate::services::RetentionService;

/// Retention sweep job, independent of the polling cadence.
pub struct RetentionSweepJob {
    retention: Arc<RetentionService>,
    interval: Duration,
}

impl RetentionSweepJob {
    pub fn new(retention: Arc<RetentionService>, interval: Duration) -> Self {
        Self {
            retention,
            interval,
        }
    }
}

#[async_trait]
impl SchedulerJob for RetentionSweepJob {
    fn name(&self) -> &'static str {
        "RetentionSweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        let stats = self.retention.sweep().await?;

        if stats.removed > 0 || stats.failed > 0 {
            tracing::info!(
                "Retention sweep completed: {} removed, {} failed",
                stats.removed,
                stats.failed
            );
        } else {
            tracing::debug!("Retention sweep completed: nothing to remove");
        }

        Ok(())
    }
}
