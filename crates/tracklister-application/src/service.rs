// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end processing of one media URL.
//!
//! Flow:
//! 1. Resolve metadata (bounded, with a sanitized retry on timeout)
//! 2. Parse the description for a tracklist
//! 3. Only if that found nothing, try acoustic identification
//! 4. Assemble, falling back to the media title

use thiserror::Error;
use tracing::{debug, info};
use tracklister_domain::MediaReference;

use crate::acoustic::AcousticFallback;
use crate::assembler::{assemble, Tracklist};
use crate::resolution::{ResolutionOrchestrator, ResolveError};
use crate::tracklist::parse_tracklist;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("URL is required")]
    MissingUrl,

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Clone)]
pub struct TracklistService {
    orchestrator: ResolutionOrchestrator,
    acoustic: Option<AcousticFallback>,
}

impl TracklistService {
    /// `acoustic` is `None` when identification is disabled or not configured.
    pub fn new(orchestrator: ResolutionOrchestrator, acoustic: Option<AcousticFallback>) -> Self {
        Self {
            orchestrator,
            acoustic,
        }
    }

    pub async fn process(&self, url: &str) -> Result<Tracklist, ProcessError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProcessError::MissingUrl);
        }
        let original = MediaReference::new(url);

        let resolution = self.orchestrator.resolve(&original).await?;
        let parsed = parse_tracklist(&resolution.media.description);
        debug!(
            target: "application",
            url = %original,
            attempts = resolution.attempts,
            parsed = parsed.len(),
            "metadata resolved"
        );

        let identified = match &self.acoustic {
            Some(acoustic)
                if parsed.is_empty() && acoustic.accepts(resolution.media.duration_secs) =>
            {
                acoustic
                    .run(&resolution.resolved, resolution.media.duration_secs)
                    .await
                    .into_tracks()
            }
            _ => Vec::new(),
        };

        let tracklist = assemble(&original, resolution.media, parsed, identified);
        info!(
            target: "application",
            url = %original,
            media_type = %tracklist.media_type,
            tracks = tracklist.tracks.len(),
            "tracklist assembled"
        );
        Ok(tracklist)
    }
}
