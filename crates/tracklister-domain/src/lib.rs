// SPDX-License-Identifier: GPL-3.0-or-later
use serde::{Deserialize, Serialize};

/// Timestamp used for synthetic entries that cover the whole media.
pub const START_TIMESTAMP: &str = "00:00";

// ============================================================================
// Value Objects
// ============================================================================

/// The media URL as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaReference(String);

impl MediaReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single entry of a tracklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub time: String,
    pub title: String,
}

impl TrackEntry {
    pub fn new(time: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            title: title.into(),
        }
    }

    /// Entry that stands for the whole media, starting at `00:00`.
    pub fn whole_media(title: impl Into<String>) -> Self {
        Self::new(START_TIMESTAMP, title)
    }
}

/// Candidate returned by acoustic identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedTrack {
    pub artist: String,
    pub title: String,
}

impl RecognizedTrack {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// `"<artist> - <title>"`, dropping the separator when either side is blank.
    pub fn display_title(&self) -> String {
        let artist = self.artist.trim();
        let title = self.title.trim();
        match (artist.is_empty(), title.is_empty()) {
            (false, false) => format!("{artist} - {title}"),
            (true, _) => title.to_string(),
            (false, true) => artist.to_string(),
        }
    }

    pub fn into_track_entry(self) -> TrackEntry {
        TrackEntry::whole_media(self.display_title())
    }
}

/// Metadata returned by one successful extraction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Whole seconds; zero when the extractor did not report a duration.
    #[serde(default)]
    pub duration_secs: u64,
    /// Identifier of the extractor backend that handled the URL.
    pub extractor: Option<String>,
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    YouTube,
    SoundCloud,
    Other(String),
    Unknown,
}

impl MediaType {
    /// Classify media from the request URL and the extractor that matched it.
    pub fn classify(url: &str, extractor: Option<&str>) -> Self {
        let url = url.to_lowercase();
        let extractor = extractor.map(str::trim).filter(|id| !id.is_empty());
        let extractor_lower = extractor.map(str::to_lowercase);
        let extractor_is = |prefix: &str| {
            extractor_lower
                .as_deref()
                .is_some_and(|id| id.starts_with(prefix))
        };

        if url.contains("youtube") || url.contains("youtu.be") || extractor_is("youtube") {
            Self::YouTube
        } else if url.contains("soundcloud") || extractor_is("soundcloud") {
            Self::SoundCloud
        } else if let Some(id) = extractor {
            Self::Other(id.to_string())
        } else {
            Self::Unknown
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::YouTube => "YouTube",
            Self::SoundCloud => "SoundCloud",
            Self::Other(id) => id,
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_url_or_extractor() {
        assert_eq!(
            MediaType::classify("https://www.youtube.com/watch?v=abc", None),
            MediaType::YouTube
        );
        assert_eq!(
            MediaType::classify("https://youtu.be/abc", Some("youtube")),
            MediaType::YouTube
        );
        assert_eq!(
            MediaType::classify("https://example.com/v/1", Some("youtube:tab")),
            MediaType::YouTube
        );
        assert_eq!(
            MediaType::classify("https://SoundCloud.com/artist/set", None),
            MediaType::SoundCloud
        );
        assert_eq!(
            MediaType::classify("https://vimeo.com/1", Some("vimeo")),
            MediaType::Other("vimeo".to_string())
        );
        assert_eq!(MediaType::classify("https://vimeo.com/1", Some("  ")), MediaType::Unknown);
        assert_eq!(MediaType::classify("https://vimeo.com/1", None).label(), "Unknown");
    }

    #[test]
    fn recognized_track_title_composition() {
        assert_eq!(
            RecognizedTrack::new("Daft Punk", "Veridis Quo").display_title(),
            "Daft Punk - Veridis Quo"
        );
        assert_eq!(RecognizedTrack::new("", "Veridis Quo").display_title(), "Veridis Quo");
        assert_eq!(RecognizedTrack::new("Daft Punk", " ").display_title(), "Daft Punk");

        let entry = RecognizedTrack::new("A", "B").into_track_entry();
        assert_eq!(entry, TrackEntry::new("00:00", "A - B"));
    }

    #[test]
    fn track_entry_serializes_time_and_title() {
        let json = serde_json::to_value(TrackEntry::new("1:23", "Intro")).unwrap();
        assert_eq!(json, serde_json::json!({"time": "1:23", "title": "Intro"}));
    }
}
