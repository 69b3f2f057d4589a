// SPDX-License-Identifier: GPL-3.0-or-later
use lazy_static::lazy_static;
use regex::Regex;
use tracklister_domain::TrackEntry;

lazy_static! {
    // `M:SS`, `MM:SS`, `H:MM:SS` or `HH:MM:SS`, a dash or colon, then the rest of the line.
    static ref TIMESTAMPED_LINE: Regex =
        Regex::new(r"([0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?)\s*[-–—:]\s*(.*)")
            .expect("timestamp regex is valid");
}

/// Extract timestamped entries from a media description, in source order.
pub fn parse_tracklist(description: &str) -> Vec<TrackEntry> {
    TIMESTAMPED_LINE
        .captures_iter(description)
        .map(|caps| TrackEntry::new(&caps[1], caps[2].trim()))
        .collect()
}
