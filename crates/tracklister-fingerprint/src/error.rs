// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("AcoustID API error: {0}")]
    AcoustidError(String),

    #[error("No matches returned by AcoustID")]
    NoMatches,

    #[error("Low confidence match (score: {score})")]
    LowConfidence { score: f32 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl FingerprintError {
    /// Lookup finished but nothing was good enough to report.
    pub fn is_unidentified(&self) -> bool {
        matches!(self, Self::NoMatches | Self::LowConfidence { .. })
    }
}
