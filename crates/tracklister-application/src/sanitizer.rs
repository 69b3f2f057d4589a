// SPDX-License-Identifier: GPL-3.0-or-later

//! Removal of the playlist selector from media URLs.
//!
//! A `list` parameter makes the extractor resolve the whole collection
//! instead of the single item the link points at.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use url::{form_urlencoded, Url};

/// Query key selecting a playlist; matched case-insensitively.
pub const PLAYLIST_PARAM: &str = "list";

lazy_static! {
    static ref PLAYLIST_PARAM_PATTERN: Regex =
        Regex::new(r"(?i)([?&])list=[^&#]*(&?)").expect("playlist param regex is valid");
}

/// Remove every `list` query parameter from `raw`, keeping everything else.
///
/// Other parameters keep their relative order, duplicates and blank values.
/// A URL without a query, or without a `list` key, is returned unchanged.
/// Input that does not parse as an absolute URL goes through a textual
/// removal instead; this function never fails.
pub fn sanitize(raw: &str) -> String {
    if Url::parse(raw).is_err() {
        return sanitize_textually(raw);
    }

    let (before_fragment, fragment) = split_fragment(raw);
    let Some((prefix, query)) = before_fragment.split_once('?') else {
        return raw.to_string();
    };
    if query.is_empty() {
        return raw.to_string();
    }

    let pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
        form_urlencoded::parse(query.as_bytes()).collect();
    let (removed, kept): (Vec<_>, Vec<_>) = pairs
        .into_iter()
        .partition(|(key, _)| key.eq_ignore_ascii_case(PLAYLIST_PARAM));
    if removed.is_empty() {
        return raw.to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(kept)
        .finish();

    let mut cleaned = String::with_capacity(raw.len());
    cleaned.push_str(prefix);
    if !query.is_empty() {
        cleaned.push('?');
        cleaned.push_str(&query);
    }
    cleaned.push_str(fragment);
    cleaned
}

/// Returns the part before `#` and the fragment including its `#`.
fn split_fragment(raw: &str) -> (&str, &str) {
    match raw.find('#') {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    }
}

fn sanitize_textually(raw: &str) -> String {
    let (before_fragment, fragment) = split_fragment(raw);
    if !PLAYLIST_PARAM_PATTERN.is_match(before_fragment) {
        return raw.to_string();
    }
    let mut current = before_fragment.to_string();

    // Adjacent `list` pairs share a separator, so one pass may leave one behind.
    loop {
        let next = PLAYLIST_PARAM_PATTERN
            .replace_all(&current, |caps: &Captures<'_>| {
                if &caps[1] == "?" {
                    "?"
                } else if &caps[2] == "&" {
                    "&"
                } else {
                    ""
                }
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    let current = current.replace("?&", "?");
    let trimmed = current.trim_end_matches('&').trim_end_matches('?');
    format!("{trimmed}{fragment}")
}
