// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{FingerprintError, Result};
use crate::fingerprint::Fingerprint;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const ACOUSTID_API_BASE: &str = "https://api.acoustid.org/v2";
const USER_AGENT: &str = concat!("Tracklister/", env!("CARGO_PKG_VERSION"));

/// A MusicBrainz recording matched by an AcoustID lookup, flattened with the score
/// of the AcoustID result that contained it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingMatch {
    /// MusicBrainz recording ID.
    pub id: Uuid,
    pub title: Option<String>,
    pub artists: Vec<RecordingArtist>,
    /// Match score (0-1), higher is more confident.
    pub score: f32,
}

impl RecordingMatch {
    /// Artist credit as a single display string.
    pub fn artist_credit(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingArtist {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct AcoustidResponse {
    status: String,
    #[serde(default)]
    results: Vec<AcoustidResult>,
    error: Option<AcoustidErrorBody>,
}

#[derive(Debug, Deserialize)]
struct AcoustidErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AcoustidResult {
    score: f32,
    #[serde(default)]
    recordings: Vec<AcoustidRecording>,
}

#[derive(Debug, Deserialize)]
struct AcoustidRecording {
    id: Uuid,
    title: Option<String>,
    #[serde(default)]
    artists: Vec<RecordingArtist>,
}

/// AcoustID API client for fingerprint lookup.
#[derive(Debug, Clone)]
pub struct AcoustidClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AcoustidClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> AcoustidClientBuilder {
        AcoustidClientBuilder::new(api_key)
    }

    /// Look a fingerprint up and return every recording with a score of at least `min_score`.
    ///
    /// The fingerprint is sent as a form body: a two minute fingerprint is too
    /// long to fit comfortably in a query string.
    pub async fn lookup(
        &self,
        fingerprint: &Fingerprint,
        min_score: f32,
    ) -> Result<Vec<RecordingMatch>> {
        check_min_score(min_score)?;
        fingerprint.validate()?;

        let url = format!("{}/lookup", self.base_url);
        let duration = fingerprint.duration.to_string();
        let form = [
            ("client", self.api_key.as_str()),
            ("format", "json"),
            ("meta", "recordings"),
            ("duration", duration.as_str()),
            ("fingerprint", fingerprint.hash.as_str()),
        ];

        trace!(target: "fingerprint", %url, duration = fingerprint.duration, "AcoustID lookup");

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();
        debug!(target: "fingerprint", %status, "AcoustID response status");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(FingerprintError::AcoustidError(format!("HTTP {status}: {body}")));
        }

        let api_response: AcoustidResponse = serde_json::from_str(&body)?;
        if !api_response.status.eq_ignore_ascii_case("ok") {
            let message = api_response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(FingerprintError::AcoustidError(message));
        }

        Ok(flatten(api_response.results)
            .into_iter()
            .filter(|m| m.score >= min_score)
            .collect())
    }

    /// Return the single highest scoring recording.
    ///
    /// # Errors
    /// - `NoMatches` if AcoustID knows no recording for the fingerprint.
    /// - `LowConfidence` if the best recording scores below `min_score`.
    pub async fn lookup_best(
        &self,
        fingerprint: &Fingerprint,
        min_score: f32,
    ) -> Result<RecordingMatch> {
        check_min_score(min_score)?;

        let best = self
            .lookup(fingerprint, 0.0)
            .await?
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(FingerprintError::NoMatches)?;

        if best.score >= min_score {
            Ok(best)
        } else {
            Err(FingerprintError::LowConfidence { score: best.score })
        }
    }
}

fn check_min_score(min_score: f32) -> Result<()> {
    if (0.0..=1.0).contains(&min_score) {
        Ok(())
    } else {
        Err(FingerprintError::AcoustidError(
            "Invalid parameter: min_score must be between 0.0 and 1.0".to_string(),
        ))
    }
}

fn flatten(results: Vec<AcoustidResult>) -> Vec<RecordingMatch> {
    results
        .into_iter()
        .flat_map(|result| {
            let score = result.score;
            result.recordings.into_iter().map(move |recording| RecordingMatch {
                id: recording.id,
                title: recording.title,
                artists: recording.artists,
                score,
            })
        })
        .collect()
}

/// Builder for AcoustID client.
#[derive(Debug)]
pub struct AcoustidClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AcoustidClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ACOUSTID_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom base URL (useful for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// # Errors
    /// Returns an error if the base URL does not parse or the HTTP client cannot be created.
    pub fn build(self) -> Result<AcoustidClient> {
        Url::parse(&self.base_url)
            .map_err(|e| FingerprintError::AcoustidError(format!("Invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(AcoustidClient {
            client,
            base_url: self.base_url,
            api_key: self.api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_response() -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "results": [
                {
                    "id": "9ff43b6a-4f16-427c-93c2-92307ca505e0",
                    "score": 0.95,
                    "recordings": [{
                        "id": "0dd2d1a0-88f2-41a4-b6da-0f3ba8caf50a",
                        "title": "Fake Plastic Trees",
                        "artists": [{
                            "id": "a74b1b7f-71a5-4011-9441-d0b5e4122711",
                            "name": "Radiohead"
                        }]
                    }]
                },
                {
                    "id": "1b8b1f1e-0000-4c3b-9d7a-1d6f0e2f0a11",
                    "score": 0.4,
                    "recordings": [{
                        "id": "5e2f7f34-0e3a-4a0a-8a5f-6c3d7f2b9c10",
                        "title": "Something Else"
                    }]
                }
            ]
        })
    }

    async fn client_for(server: &MockServer) -> AcoustidClient {
        AcoustidClient::builder("test-key")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn lookup_posts_fingerprint_and_filters_by_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .and(body_string_contains("fingerprint=AQADvEWZ"))
            .and(body_string_contains("duration=120"))
            .and(body_string_contains("client=test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let fp = Fingerprint::new("AQADvEWZ", 120);
        let matches = client.lookup(&fp, 0.5).await.unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title.as_deref(), Some("Fake Plastic Trees"));
        assert_eq!(matches[0].artist_credit(), "Radiohead");
    }

    #[tokio::test]
    async fn lookup_best_picks_highest_score() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let best = client
            .lookup_best(&Fingerprint::new("AQADvEWZ", 120), 0.8)
            .await
            .unwrap();
        assert_eq!(best.title.as_deref(), Some("Fake Plastic Trees"));
    }

    #[tokio::test]
    async fn lookup_best_distinguishes_no_match_from_low_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .and(body_string_contains("fingerprint=EMPTY"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "ok", "results": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .and(body_string_contains("fingerprint=AQADvEWZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_response()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;

        let err = client
            .lookup_best(&Fingerprint::new("EMPTY", 120), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, FingerprintError::NoMatches));

        let err = client
            .lookup_best(&Fingerprint::new("AQADvEWZ", 120), 0.99)
            .await
            .unwrap_err();
        assert!(matches!(err, FingerprintError::LowConfidence { score } if score > 0.9));
        assert!(err.is_unidentified());
    }

    #[tokio::test]
    async fn api_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lookup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "error": {"code": 4, "message": "invalid API key"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .lookup(&Fingerprint::new("AQADvEWZ", 120), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, FingerprintError::AcoustidError(ref m) if m == "invalid API key"));
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .lookup(&Fingerprint::new("AQADvEWZ", 120), 0.5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn slow_lookup_is_cut_off_by_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_response())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = AcoustidClient::builder("test-key")
            .base_url(server.uri())
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let err = client
            .lookup(&Fingerprint::new("AQADvEWZ", 120), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, FingerprintError::RequestFailed(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn invalid_min_score_rejected_before_request() {
        let client = AcoustidClient::new("test-key").unwrap();
        let fp = Fingerprint::new("AQADvEWZ", 120);
        assert!(client.lookup(&fp, 1.5).await.is_err());
        assert!(client.lookup_best(&fp, -0.1).await.is_err());
    }

    #[test]
    fn builder_rejects_invalid_base_url() {
        let result = AcoustidClient::builder("key").base_url("not a url").build();
        assert!(matches!(result, Err(FingerprintError::AcoustidError(_))));
    }
}
