// SPDX-License-Identifier: GPL-3.0-or-later
use tracklister_domain::{ExtractionResult, MediaReference, MediaType, TrackEntry};

/// Final result of processing one media URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracklist {
    pub title: Option<String>,
    pub media_type: MediaType,
    pub tracks: Vec<TrackEntry>,
}

/// Combine the stage outputs.
///
/// Description tracks win over identified tracks; with neither, the media
/// title becomes a single entry at `00:00`, so the list is never empty.
pub fn assemble(
    original: &MediaReference,
    media: ExtractionResult,
    parsed: Vec<TrackEntry>,
    identified: Vec<TrackEntry>,
) -> Tracklist {
    let media_type = MediaType::classify(original.as_str(), media.extractor.as_deref());

    let tracks = if !parsed.is_empty() {
        parsed
    } else if !identified.is_empty() {
        identified
    } else {
        vec![TrackEntry::whole_media(media.title.clone().unwrap_or_default())]
    };

    Tracklist {
        title: media.title,
        media_type,
        tracks,
    }
}
