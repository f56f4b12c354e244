use std::path::Path;

use async_trait::async_trait;

use crate::models::MediaFile;
use crate::Result;

/// Core media fetch interface.
///
/// Implementations download the media for one external video id to the given
/// target path and report what was written. The caller owns concurrency
/// limits and timeouts; an implementation only has to make sure a cancelled
/// or failed fetch does not leave a file that looks complete.
///
/// All implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the media for `external_id` to `target_path`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`](crate::FetchError) when the underlying tool
    /// cannot be spawned, reports a failure, or produces no output file.
    async fn download(&self, external_id: &str, target_path: &Path) -> Result<MediaFile>;
}
