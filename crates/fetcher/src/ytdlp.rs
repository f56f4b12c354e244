use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::models::MediaFile;
use crate::traits::MediaFetcher;
use crate::{FetchError, Result};

/// Format selector: best mp4 up to 1080p, matching what the media tool can
/// merge without transcoding.
const FORMAT: &str = "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080][ext=mp4]/best";

/// Media fetcher backed by the yt-dlp command line tool.
pub struct YtDlpFetcher {
    binary: PathBuf,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
        }
    }

    /// Use a specific yt-dlp binary instead of resolving from PATH
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_args(external_id: &str, target_path: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            FORMAT.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--match-filter".to_string(),
            "!is_live".to_string(),
            "--write-thumbnail".to_string(),
            "--convert-thumbnails".to_string(),
            "jpg".to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "duration".to_string(),
            "-o".to_string(),
            target_path.to_string_lossy().to_string(),
            format!("https://www.youtube.com/watch?v={}", external_id),
        ]
    }

    fn parse_duration(stdout: &str) -> Option<f64> {
        stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| line.trim().parse::<f64>().ok())
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn download(&self, external_id: &str, target_path: &Path) -> Result<MediaFile> {
        let args = Self::build_args(external_id, target_path);
        tracing::debug!("Spawning {} for video {}", self.binary.display(), external_id);

        // kill_on_drop so a timed-out or cancelled fetch does not leave the
        // subprocess running after the worker future is dropped
        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("yt-dlp exited with a failure status")
                .to_string();
            return Err(FetchError::failed(reason));
        }

        // A zero exit without an output file happens when the match filter
        // rejects the video (e.g. a live stream)
        if tokio::fs::metadata(target_path).await.is_err() {
            return Err(FetchError::MissingOutput(target_path.to_path_buf()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = Self::parse_duration(&stdout);

        let thumbnail = target_path.with_extension("jpg");
        let thumbnail_path = if tokio::fs::metadata(&thumbnail).await.is_ok() {
            Some(thumbnail)
        } else {
            None
        };

        Ok(MediaFile {
            local_path: target_path.to_path_buf(),
            duration,
            thumbnail_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_watch_url_and_target() {
        let args = YtDlpFetcher::build_args("dQw4w9WgXcQ", Path::new("/data/media/dQw4w9WgXcQ.mp4"));

        assert_eq!(
            args.last().unwrap(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        let o_pos = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o_pos + 1], "/data/media/dQw4w9WgXcQ.mp4");
        assert!(args.contains(&"--no-playlist".to_string()));
    }

    #[test]
    fn parses_duration_from_last_line() {
        assert_eq!(YtDlpFetcher::parse_duration("212.0\n"), Some(212.0));
        assert_eq!(
            YtDlpFetcher::parse_duration("[download] done\n185\n"),
            Some(185.0)
        );
        assert_eq!(YtDlpFetcher::parse_duration("NA\n"), None);
        assert_eq!(YtDlpFetcher::parse_duration(""), None);
    }
}
