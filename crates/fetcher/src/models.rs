use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a completed media fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path the media was written to
    pub local_path: PathBuf,
    /// Media duration in seconds, when the tool reports one
    pub duration: Option<f64>,
    /// Path of the thumbnail written alongside the media, if any
    pub thumbnail_path: Option<PathBuf>,
}
