mod acquisition;
mod download;
mod retention;
mod scheduler;

pub use acquisition::{AcquisitionService, PollStats};
pub use download::DownloadService;
pub use retention::{RetentionService, SweepStats};
pub use scheduler::{FeedPollJob, JobResult, RetentionSweepJob, SchedulerJob, SchedulerService};
