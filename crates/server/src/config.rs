use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            _ => Self::Dev,
        }
    }

    /// Returns the default data path for this environment
    pub fn default_data_path(&self) -> PathBuf {
        match self {
            Self::Dev => PathBuf::from("./data"),
            Self::Prod => PathBuf::from("/data"),
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub env: Environment,
    pub data_path: PathBuf,
    pub database_url: String,
    pub max_connections: u32,

    /// Feeds are polled on this interval
    pub poll_interval_secs: u64,
    /// The retention sweep runs on this interval, independent of polling
    pub sweep_interval_secs: u64,
    /// Candidates published longer ago than this are never enqueued
    pub max_download_age_days: i64,
    /// Downloaded, non-kept videos older than this are removed by the sweep
    pub retention_age_days: i64,
    /// Maximum number of concurrent downloads
    pub worker_pool_size: usize,
    /// A single download attempt is cancelled after this long
    pub download_timeout_secs: u64,
    /// In-flight downloads get this long to finish on shutdown
    pub shutdown_grace_secs: u64,
}

impl Config {
    pub fn new(env: Environment, data_path: impl AsRef<Path>) -> Self {
        let data_path = data_path.as_ref().to_path_buf();
        let database_url = format!("sqlite:{}?mode=rwc", data_path.join("tubefeed.db").display());
        Self {
            env,
            data_path,
            database_url,
            max_connections: 5,
            poll_interval_secs: 600,
            sweep_interval_secs: 3600,
            max_download_age_days: 30,
            retention_age_days: 10,
            worker_pool_size: 3,
            download_timeout_secs: 1800,
            shutdown_grace_secs: 30,
        }
    }

    /// Build a Config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `TUBEFEED_POLL_INTERVAL_SECONDS`,
    /// `TUBEFEED_SWEEP_INTERVAL_SECONDS`, `TUBEFEED_MAX_DOWNLOAD_AGE_DAYS`,
    /// `TUBEFEED_RETENTION_AGE_DAYS`, `TUBEFEED_WORKER_POOL_SIZE`,
    /// `TUBEFEED_DOWNLOAD_TIMEOUT_SECONDS`, `TUBEFEED_SHUTDOWN_GRACE_SECONDS`.
    pub fn from_env(env: Environment, data_path: impl AsRef<Path>) -> Self {
        let mut config = Self::new(env, data_path);

        if let Some(v) = env_parse("TUBEFEED_POLL_INTERVAL_SECONDS") {
            config.poll_interval_secs = v;
        }
        if let Some(v) = env_parse("TUBEFEED_SWEEP_INTERVAL_SECONDS") {
            config.sweep_interval_secs = v;
        }
        if let Some(v) = env_parse("TUBEFEED_MAX_DOWNLOAD_AGE_DAYS") {
            config.max_download_age_days = v;
        }
        if let Some(v) = env_parse("TUBEFEED_RETENTION_AGE_DAYS") {
            config.retention_age_days = v;
        }
        if let Some(v) = env_parse("TUBEFEED_WORKER_POOL_SIZE") {
            config.worker_pool_size = v;
        }
        if let Some(v) = env_parse("TUBEFEED_DOWNLOAD_TIMEOUT_SECONDS") {
            config.download_timeout_secs = v;
        }
        if let Some(v) = env_parse("TUBEFEED_SHUTDOWN_GRACE_SECONDS") {
            config.shutdown_grace_secs = v;
        }

        config
    }

    /// Returns the path to the downloaded media directory
    pub fn media_path(&self) -> PathBuf {
        self.data_path.join("media")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring unparseable {}='{}'", name, raw);
                None
            }
        },
        Err(_) => None,
    }
}
