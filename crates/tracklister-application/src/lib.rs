// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use anyhow::{Context, Result};
use tracklister_config::AppConfig;
use tracklister_fingerprint::{AcoustidClient, AcoustidRecognizer};
use tracklister_infrastructure::{DownloadOptions, YtDlp};

pub mod acoustic;
pub mod assembler;
pub mod resolution;
pub mod sanitizer;
pub mod service;
pub mod tracklist;

pub use acoustic::{AcousticFallback, AcousticOutcome, DegradeReason};
pub use assembler::{assemble, Tracklist};
pub use resolution::{Resolution, ResolutionOrchestrator, ResolveError};
pub use sanitizer::sanitize;
pub use service::{ProcessError, TracklistService};
pub use tracklist::parse_tracklist;

use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service: Arc<TracklistService>,
}

impl AppState {
    pub fn new(config: AppConfig, service: TracklistService) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Wire the production adapters: `yt-dlp` for extraction and download,
    /// Chromaprint + AcoustID for identification.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let ytdlp = Arc::new(YtDlp::from_config(&config.resolution));
        let orchestrator = ResolutionOrchestrator::new(ytdlp.clone(), &config.resolution);

        let acoustic = match (&config.acoustic.api_key, config.acoustic.enabled) {
            (Some(api_key), true) => {
                let mut builder = AcoustidClient::builder(api_key.as_str())
                    .timeout(config.acoustic.lookup_timeout());
                if let Some(base_url) = &config.acoustic.acoustid_base_url {
                    builder = builder.base_url(base_url.as_str());
                }
                let client = builder.build().context("building AcoustID client")?;
                let recognizer = Arc::new(AcoustidRecognizer::new(client, config.acoustic.min_score));
                Some(AcousticFallback::new(
                    ytdlp,
                    recognizer,
                    DownloadOptions::from_config(&config.resolution, &config.acoustic),
                    &config.acoustic,
                ))
            }
            (None, true) => {
                warn!(target: "application", "no AcoustID API key configured, acoustic identification disabled");
                None
            }
            (_, false) => None,
        };

        Ok(Self::new(config, TracklistService::new(orchestrator, acoustic)))
    }

    pub fn on_start(&self) {
        info!(
            target: "application",
            attempt_timeout_secs = self.config.resolution.attempt_timeout_secs,
            acoustic_enabled = self.config.acoustic.enabled,
            "application state initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_acoustid_key() {
        let state = AppState::from_config(AppConfig::default()).unwrap();
        state.on_start();
        assert_eq!(state.config.resolution.ytdlp_path, "yt-dlp");
    }

    #[test]
    fn rejects_malformed_acoustid_base_url() {
        let mut config = AppConfig::default();
        config.acoustic.api_key = Some("key".to_string());
        config.acoustic.acoustid_base_url = Some("not a url".to_string());
        assert!(AppState::from_config(config).is_err());
    }
}
