use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use feed::FeedClient;
use fetcher::YtDlpFetcher;

use crate::config::Config;
use crate::services::{
    AcquisitionService, DownloadService, FeedPollJob, RetentionService, RetentionSweepJob,
    SchedulerService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub downloads: Arc<DownloadService>,
    pub acquisition: Arc<AcquisitionService>,
    pub retention: Arc<RetentionService>,
    pub scheduler: Arc<SchedulerService>,
    pub poll_job: Arc<FeedPollJob>,
    pub sweep_job: Arc<RetentionSweepJob>,
}

impl AppState {
    /// Wire up all services and start the scheduler.
    ///
    /// Cancelling the shutdown token stops the scheduler loops. In-flight
    /// downloads are deliberately NOT tied to it: they keep their own token
    /// so [`DownloadService::shutdown`] can grant them a grace period before
    /// aborting.
    pub fn new(db: SqlitePool, config: Config, shutdown: CancellationToken) -> Self {
        let config = Arc::new(config);

        let downloads = Arc::new(DownloadService::new(
            db.clone(),
            Arc::new(YtDlpFetcher::new()),
            config.media_path(),
            config.worker_pool_size,
            config.download_timeout(),
            CancellationToken::new(),
        ));

        let acquisition = Arc::new(AcquisitionService::new(
            db.clone(),
            Arc::new(FeedClient::new()),
            Arc::clone(&downloads),
            config.max_download_age_days,
        ));

        let retention = Arc::new(RetentionService::new(
            db.clone(),
            config.retention_age_days,
        ));

        // Jobs are kept around separately so the API can trigger them manually
        let poll_job = Arc::new(FeedPollJob::new(
            Arc::clone(&acquisition),
            config.poll_interval(),
        ));
        let sweep_job = Arc::new(RetentionSweepJob::new(
            Arc::clone(&retention),
            config.sweep_interval(),
        ));

        let scheduler = SchedulerService::new()
            .with_arc_job(Arc::clone(&poll_job))
            .with_arc_job(Arc::clone(&sweep_job));
        scheduler.start(shutdown.child_token());

        Self {
            db,
            config,
            downloads,
            acquisition,
            retention,
            scheduler: Arc::new(scheduler),
            poll_job,
            sweep_job,
        }
    }
}
