// SPDX-License-Identifier: GPL-3.0-or-later

//! Acoustic fallback: download the audio and ask a recognizer what it is.
//!
//! The pipeline contributes at most one track and never fails a request.
//! Every problem ends up as an [`AcousticOutcome::Degraded`] with the reason
//! attached, so callers can log or inspect it without handling errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use tracklister_config::AcousticConfig;
use tracklister_domain::{MediaReference, TrackEntry};
use tracklister_fingerprint::Recognizer;
use tracklister_infrastructure::{DownloadOptions, MediaDownloader};

/// Extensions the downloader may leave behind after audio extraction.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a"];

const WORKDIR_PREFIX: &str = "tracklister-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradeReason {
    #[error("duration {0}s is outside the accepted range")]
    DurationOutOfRange(u64),
    #[error("could not create a working directory: {0}")]
    WorkDir(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("no audio file was produced")]
    NoAudioFile,
    #[error("could not read audio: {0}")]
    ReadFailed(String),
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),
    #[error("audio was not identified")]
    NotIdentified,
    #[error("gave up after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcousticOutcome {
    Identified(TrackEntry),
    Degraded(DegradeReason),
}

impl AcousticOutcome {
    pub fn into_tracks(self) -> Vec<TrackEntry> {
        match self {
            Self::Identified(track) => vec![track],
            Self::Degraded(_) => Vec::new(),
        }
    }
}

/// Download-and-recognize pipeline.
#[derive(Clone)]
pub struct AcousticFallback {
    downloader: Arc<dyn MediaDownloader>,
    recognizer: Arc<dyn Recognizer>,
    options: DownloadOptions,
    max_duration_secs: u64,
    pipeline_timeout: Duration,
}

impl AcousticFallback {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        recognizer: Arc<dyn Recognizer>,
        options: DownloadOptions,
        config: &AcousticConfig,
    ) -> Self {
        Self {
            downloader,
            recognizer,
            options,
            max_duration_secs: config.max_duration_secs,
            pipeline_timeout: config.pipeline_timeout(),
        }
    }

    /// Unknown (zero) durations and anything at or above the cap are skipped.
    pub fn accepts(&self, duration_secs: u64) -> bool {
        duration_secs > 0 && duration_secs < self.max_duration_secs
    }

    pub async fn run(&self, media: &MediaReference, duration_secs: u64) -> AcousticOutcome {
        if !self.accepts(duration_secs) {
            return AcousticOutcome::Degraded(DegradeReason::DurationOutOfRange(duration_secs));
        }

        info!(target: "acoustic", url = %media, duration_secs, "attempting acoustic identification");
        let outcome = match timeout(self.pipeline_timeout, self.identify(media)).await {
            Ok(Ok(track)) => AcousticOutcome::Identified(track),
            Ok(Err(reason)) => AcousticOutcome::Degraded(reason),
            Err(_) => AcousticOutcome::Degraded(DegradeReason::TimedOut(self.pipeline_timeout)),
        };

        match &outcome {
            AcousticOutcome::Identified(track) => {
                info!(target: "acoustic", url = %media, title = %track.title, "audio identified")
            }
            AcousticOutcome::Degraded(reason) => {
                warn!(target: "acoustic", url = %media, %reason, "acoustic identification produced no track")
            }
        }
        outcome
    }

    async fn identify(&self, media: &MediaReference) -> Result<TrackEntry, DegradeReason> {
        // Removed when dropped, including when the timeout abandons this future.
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(|e| DegradeReason::WorkDir(e.to_string()))?;

        self.downloader
            .download(media, workdir.path(), &self.options)
            .await
            .map_err(|e| DegradeReason::DownloadFailed(e.to_string()))?;

        let audio_path = find_audio_file(workdir.path())
            .await
            .map_err(|e| DegradeReason::ReadFailed(e.to_string()))?
            .ok_or(DegradeReason::NoAudioFile)?;
        debug!(target: "acoustic", path = %audio_path.display(), "located audio file");

        let audio = tokio::fs::read(&audio_path)
            .await
            .map_err(|e| DegradeReason::ReadFailed(e.to_string()))?;

        let recognized = self
            .recognizer
            .recognize(audio)
            .await
            .map_err(|e| DegradeReason::RecognitionFailed(e.to_string()))?
            .ok_or(DegradeReason::NotIdentified)?;

        Ok(recognized.into_track_entry())
    }
}

/// First regular file, by name, with an allowed audio extension.
async fn find_audio_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut candidates = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)));
        if is_audio {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}
