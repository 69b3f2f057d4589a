// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::{FingerprintError, Result};

/// Chromaprint fingerprint of a downloaded audio artifact.
///
/// Generated from at most the first 120 seconds of audio, which is what
/// AcoustID expects for lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fingerprint {
    /// Compressed fingerprint, base64 encoded (Chromaprint emits the URL-safe alphabet).
    pub hash: String,
    /// Seconds of audio that went into the fingerprint.
    pub duration: u32,
}

impl Fingerprint {
    pub fn new(hash: impl Into<String>, duration: u32) -> Self {
        Self {
            hash: hash.into(),
            duration,
        }
    }

    /// Reject fingerprints AcoustID would refuse before spending a request on them.
    pub fn validate(&self) -> Result<()> {
        if self.hash.is_empty() {
            return Err(FingerprintError::InvalidFingerprint(
                "fingerprint hash is empty".to_string(),
            ));
        }

        if self.duration == 0 {
            return Err(FingerprintError::InvalidFingerprint(
                "duration must be > 0".to_string(),
            ));
        }

        let body = self.hash.trim_end_matches('=');
        if self.hash.len() - body.len() > 2 {
            return Err(FingerprintError::InvalidFingerprint(
                "invalid base64 padding".to_string(),
            ));
        }

        let valid = body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_'));
        if !valid {
            return Err(FingerprintError::InvalidFingerprint(
                "fingerprint contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_url_safe_chromaprint_output() {
        assert!(Fingerprint::new("AQADtEmSJEkS-_g", 42).validate().is_ok());
        assert!(Fingerprint::new("AQADvEWZ==", 120).validate().is_ok());
    }

    #[test]
    fn rejects_empty_or_zero_length() {
        assert!(Fingerprint::new("", 120).validate().is_err());
        assert!(Fingerprint::new("AQADvEWZ", 0).validate().is_err());
    }

    #[test]
    fn rejects_bad_characters_and_padding() {
        assert!(Fingerprint::new("AQAD v!WZ", 120).validate().is_err());
        assert!(Fingerprint::new("AQAD=vEWZ", 120).validate().is_err());
        assert!(Fingerprint::new("AQADvEWZ===", 120).validate().is_err());
    }
}
