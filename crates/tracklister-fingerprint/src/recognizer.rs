// SPDX-License-Identifier: GPL-3.0-or-later

//! Recognition seam used by the acoustic fallback.

use async_trait::async_trait;
use tracing::{debug, info};
use tracklister_domain::RecognizedTrack;

use crate::{AcoustidClient, FingerprintError, FingerprintGenerator, RecordingMatch, Result};

/// Identifies a piece of recorded audio.
///
/// `Ok(None)` means the service answered but could not name the audio.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, audio: Vec<u8>) -> Result<Option<RecognizedTrack>>;
}

/// Local Chromaprint fingerprinting followed by an AcoustID lookup.
#[derive(Debug, Clone)]
pub struct AcoustidRecognizer {
    client: AcoustidClient,
    generator: FingerprintGenerator,
    min_score: f32,
}

impl AcoustidRecognizer {
    pub fn new(client: AcoustidClient, min_score: f32) -> Self {
        Self {
            client,
            generator: FingerprintGenerator::new(),
            min_score,
        }
    }
}

#[async_trait]
impl Recognizer for AcoustidRecognizer {
    async fn recognize(&self, audio: Vec<u8>) -> Result<Option<RecognizedTrack>> {
        let generator = self.generator;
        let fingerprint = tokio::task::spawn_blocking(move || generator.generate_from_bytes(audio))
            .await
            .map_err(|e| {
                FingerprintError::AudioProcessing(format!("fingerprint worker failed: {e}"))
            })??;

        debug!(target: "fingerprint", duration = fingerprint.duration, "fingerprint generated");

        match self.client.lookup_best(&fingerprint, self.min_score).await {
            Ok(best) => {
                let track = to_recognized(best);
                if let Some(track) = &track {
                    info!(target: "fingerprint", artist = %track.artist, title = %track.title, "audio identified");
                }
                Ok(track)
            }
            Err(e) if e.is_unidentified() => {
                debug!(target: "fingerprint", reason = %e, "audio not identified");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn to_recognized(recording: RecordingMatch) -> Option<RecognizedTrack> {
    let artist = recording.artist_credit();
    let title = recording.title.unwrap_or_default();
    if artist.trim().is_empty() && title.trim().is_empty() {
        return None;
    }
    Some(RecognizedTrack::new(artist, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acoustid::RecordingArtist;
    use uuid::Uuid;

    fn recording(title: Option<&str>, artists: &[&str]) -> RecordingMatch {
        RecordingMatch {
            id: Uuid::new_v4(),
            title: title.map(str::to_string),
            artists: artists
                .iter()
                .map(|name| RecordingArtist {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                })
                .collect(),
            score: 0.9,
        }
    }

    #[test]
    fn recording_with_multiple_artists_is_joined() {
        let track = to_recognized(recording(Some("Get Lucky"), &["Daft Punk", "Pharrell Williams"]))
            .unwrap();
        assert_eq!(track.artist, "Daft Punk, Pharrell Williams");
        assert_eq!(track.display_title(), "Daft Punk, Pharrell Williams - Get Lucky");
    }

    #[test]
    fn recording_without_names_is_not_a_result() {
        assert!(to_recognized(recording(None, &[])).is_none());
        let title_only = to_recognized(recording(Some("Intro"), &[])).unwrap();
        assert_eq!(title_only.display_title(), "Intro");
    }

    #[tokio::test]
    async fn undecodable_audio_fails_before_lookup() {
        let client = AcoustidClient::builder("key")
            .base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        let recognizer = AcoustidRecognizer::new(client, 0.5);
        let err = recognizer.recognize(b"not audio".to_vec()).await.unwrap_err();
        assert!(matches!(err, FingerprintError::AudioProcessing(_)));
    }
}
