// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata resolution with a bounded wait and a single sanitized retry.
//!
//! Only a timeout earns a second attempt, and only when stripping the
//! playlist selector actually changes the URL. Any other extractor failure is
//! final.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use tracklister_config::ResolutionConfig;
use tracklister_domain::{ExtractionResult, MediaReference};
use tracklister_infrastructure::{ExtractorError, MetadataExtractor};

use crate::sanitizer::sanitize;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("extraction timed out for both the original and the sanitized URL")]
    TimedOut,

    #[error("extraction timed out and the URL has nothing to sanitize")]
    TimedOutUnsanitizable,

    #[error("extraction failed: {0}")]
    ExtractionFailed(#[source] ExtractorError),

    #[error("extraction without the playlist parameter failed: {0}")]
    RetryFailed(#[source] ExtractorError),
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub media: ExtractionResult,
    /// The URL whose extraction succeeded: the original or its sanitized form.
    pub resolved: MediaReference,
    pub attempts: u8,
}

enum Attempt {
    Done(ExtractionResult),
    TimedOut,
    Failed(ExtractorError),
}

/// Coordinates the extractor and the sanitizer for one request at a time.
#[derive(Clone)]
pub struct ResolutionOrchestrator {
    extractor: Arc<dyn MetadataExtractor>,
    attempt_timeout: Duration,
}

impl ResolutionOrchestrator {
    pub fn new(extractor: Arc<dyn MetadataExtractor>, config: &ResolutionConfig) -> Self {
        Self::with_timeout(extractor, config.attempt_timeout())
    }

    pub fn with_timeout(extractor: Arc<dyn MetadataExtractor>, attempt_timeout: Duration) -> Self {
        Self {
            extractor,
            attempt_timeout,
        }
    }

    pub async fn resolve(&self, original: &MediaReference) -> Result<Resolution, ResolveError> {
        match self.attempt(original).await {
            Attempt::Done(media) => {
                return Ok(Resolution {
                    media,
                    resolved: original.clone(),
                    attempts: 1,
                })
            }
            Attempt::Failed(e) => {
                warn!(target: "resolution", url = %original, error = %e, "extraction failed");
                return Err(ResolveError::ExtractionFailed(e));
            }
            Attempt::TimedOut => {
                info!(target: "resolution", url = %original, timeout = ?self.attempt_timeout, "extraction timed out");
            }
        }

        let sanitized = MediaReference::new(sanitize(original.as_str()));
        if sanitized == *original {
            warn!(target: "resolution", url = %original, "timed out and nothing to sanitize");
            return Err(ResolveError::TimedOutUnsanitizable);
        }

        info!(target: "resolution", url = %sanitized, "retrying without playlist parameter");
        match self.attempt(&sanitized).await {
            Attempt::Done(media) => Ok(Resolution {
                media,
                resolved: sanitized,
                attempts: 2,
            }),
            Attempt::TimedOut => {
                warn!(target: "resolution", url = %sanitized, "retry timed out as well");
                Err(ResolveError::TimedOut)
            }
            Attempt::Failed(e) => {
                warn!(target: "resolution", url = %sanitized, error = %e, "retry failed");
                Err(ResolveError::RetryFailed(e))
            }
        }
    }

    async fn attempt(&self, media: &MediaReference) -> Attempt {
        debug!(target: "resolution", url = %media, "extracting metadata");
        match timeout(self.attempt_timeout, self.extractor.extract(media)).await {
            Ok(Ok(result)) => Attempt::Done(result),
            Ok(Err(e)) => Attempt::Failed(e),
            Err(_) => Attempt::TimedOut,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// What a scripted extractor does on one call.
    pub enum Step {
        Return(ExtractionResult),
        Fail,
        Hang,
    }

    /// Extractor fake that plays back a script and records the URLs it saw.
    pub struct ScriptedExtractor {
        steps: Mutex<VecDeque<Step>>,
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MetadataExtractor for ScriptedExtractor {
        async fn extract(
            &self,
            media: &MediaReference,
        ) -> Result<ExtractionResult, ExtractorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(media.to_string());
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Hang);
            match step {
                Step::Return(result) => Ok(result),
                Step::Fail => Err(ExtractorError::Failed {
                    status: "exit status: 1".to_string(),
                    stderr: "ERROR: Video unavailable".to_string(),
                }),
                Step::Hang => std::future::pending().await,
            }
        }
    }

    pub fn media(title: &str, description: &str, duration_secs: u64) -> ExtractionResult {
        ExtractionResult {
            title: Some(title.to_string()),
            description: description.to_string(),
            duration_secs,
            extractor: Some("youtube".to_string()),
        }
    }
}
