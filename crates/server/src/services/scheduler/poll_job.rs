use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{JobResult, SchedulerJob};
use crate::services::AcquisitionService;

/// Feed polling job.
///
/// One execution is one acquisition cycle: every subscribed channel's feed
/// is scanned and new candidates are enqueued for download. The scheduler
/// loop guarantees cycles never overlap.
pub struct FeedPollJob {
    acquisition: Arc<AcquisitionService>,
    interval: Duration,
}

impl FeedPollJob {
    pub fn new(acquisition: Arc<AcquisitionService>, interval: Duration) -> Self {
        Self {
            acquisition,
            interval,
        }
    }
}

#[async_trait]
impl SchedulerJob for FeedPollJob {
    fn name(&self) -> &'static str {
        "FeedPoll"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        tracing::info!("Starting feed poll cycle");

        let stats = self.acquisition.poll_all().await?;

        tracing::info!(
            "Feed poll completed: {} channels polled, {} failed, {} videos enqueued",
            stats.channels_polled,
            stats.channels_failed,
            stats.enqueued
        );

        Ok(())
    }
}
