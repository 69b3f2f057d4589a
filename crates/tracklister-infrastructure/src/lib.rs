// SPDX-License-Identifier: GPL-3.0-or-later

//! Adapters for the external media services.
//!
//! Both collaborators are served by `yt-dlp` run as a child process: metadata
//! extraction reads its JSON dump, audio download lets it write into a
//! directory owned by the caller.

pub mod error;
pub mod ytdlp;

use std::path::Path;

use async_trait::async_trait;
use tracklister_domain::{ExtractionResult, MediaReference};

pub use error::ExtractorError;
pub use ytdlp::YtDlp;

/// Resolves a media URL to its metadata.
///
/// Implementations must be cancel safe: dropping the returned future abandons
/// the extraction.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, media: &MediaReference) -> Result<ExtractionResult, ExtractorError>;
}

/// Options for an audio download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub format: String,
    pub audio_format: String,
    pub audio_quality: String,
    pub socket_timeout_secs: u64,
}

impl DownloadOptions {
    pub fn from_config(
        resolution: &tracklister_config::ResolutionConfig,
        acoustic: &tracklister_config::AcousticConfig,
    ) -> Self {
        Self {
            format: resolution.format.clone(),
            audio_format: acoustic.audio_format.clone(),
            audio_quality: acoustic.audio_quality.clone(),
            socket_timeout_secs: acoustic.socket_timeout_secs,
        }
    }
}

/// Downloads the audio of a media URL into `target_dir`.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(
        &self,
        media: &MediaReference,
        target_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<(), ExtractorError>;
}
