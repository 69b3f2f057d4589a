// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};
use tracklister_config::ResolutionConfig;
use tracklister_domain::{ExtractionResult, MediaReference};

use crate::{DownloadOptions, ExtractorError, MediaDownloader, MetadataExtractor};

/// Output template for downloads, relative to the target directory.
const AUDIO_OUTPUT_TEMPLATE: &str = "audio.%(ext)s";

/// Keeps error messages readable when yt-dlp dumps a traceback.
const MAX_STDERR_CHARS: usize = 2000;

/// `yt-dlp` child-process adapter.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
    format: String,
    socket_timeout_secs: u64,
}

/// Subset of the `--dump-single-json` document we care about.
#[derive(Debug, Deserialize)]
struct InfoDocument {
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    extractor: Option<String>,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        let defaults = ResolutionConfig::default();
        Self {
            binary: binary.into(),
            format: defaults.format,
            socket_timeout_secs: defaults.socket_timeout_secs,
        }
    }

    pub fn from_config(config: &ResolutionConfig) -> Self {
        Self {
            binary: config.ytdlp_path.clone(),
            format: config.format.clone(),
            socket_timeout_secs: config.socket_timeout_secs,
        }
    }

    fn extract_args(&self, url: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--format".to_string(),
            self.format.clone(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    fn download_args(&self, url: &str, target_dir: &Path, options: &DownloadOptions) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--format".to_string(),
            options.format.clone(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            options.audio_format.clone(),
            "--audio-quality".to_string(),
            options.audio_quality.clone(),
            "--socket-timeout".to_string(),
            options.socket_timeout_secs.to_string(),
            "--output".to_string(),
            target_dir.join(AUDIO_OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    /// Run the binary; the child is killed if the returned future is dropped.
    async fn run(&self, args: &[String]) -> Result<Output, ExtractorError> {
        debug!(target: "extractor", binary = %self.binary, ?args, "running yt-dlp");

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractorError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .trim()
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            warn!(target: "extractor", status = %output.status, %stderr, "yt-dlp failed");
            return Err(ExtractorError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(output)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::from_config(&ResolutionConfig::default())
    }
}

#[async_trait]
impl MetadataExtractor for YtDlp {
    async fn extract(&self, media: &MediaReference) -> Result<ExtractionResult, ExtractorError> {
        let output = self.run(&self.extract_args(media.as_str())).await?;
        parse_info(&output.stdout)
    }
}

#[async_trait]
impl MediaDownloader for YtDlp {
    async fn download(
        &self,
        media: &MediaReference,
        target_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<(), ExtractorError> {
        let args = self.download_args(media.as_str(), target_dir, options);
        self.run(&args).await?;
        debug!(target: "extractor", dir = %target_dir.display(), "audio download finished");
        Ok(())
    }
}

fn parse_info(stdout: &[u8]) -> Result<ExtractionResult, ExtractorError> {
    let info: InfoDocument = serde_json::from_slice(stdout)?;
    let duration_secs = info
        .duration
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| secs as u64)
        .unwrap_or(0);

    Ok(ExtractionResult {
        title: info.title,
        description: info.description.unwrap_or_default(),
        duration_secs,
        extractor: info.extractor,
    })
}
