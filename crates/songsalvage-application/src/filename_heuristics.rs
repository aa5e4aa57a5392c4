// SPDX-License-Identifier: GPL-3.0-or-later

//! Filename heuristics for source resolution.
//!
//! Downloaded files are named `Artist - Title (annotation).ext` by convention,
//! but the annotation, spacing and even the artist part are unreliable. This
//! module turns such a name into a clean artist/title pair for searching.

use lazy_static::lazy_static;
use regex::Regex;
use songsalvage_domain::NormalizedQuery;
use tracing::trace;

/// Separator between artist and title.
pub const ARTIST_TITLE_DELIMITER: &str = " - ";

lazy_static! {
    // An opening bracket (ASCII or fullwidth) up to the nearest closing bracket of either style.
    static ref PARENTHETICAL: Regex = Regex::new(r"[（(].*?[）)]").unwrap();

    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Split a file name into a cleaned artist/title pair.
///
/// The extension (text after the last `.`) is dropped, the remainder is split
/// at the first `" - "`, and both halves are cleaned independently. Without a
/// delimiter the whole name becomes the title and the artist stays empty.
pub fn normalize_filename(hint: &str) -> NormalizedQuery {
    let stem = match hint.rfind('.') {
        Some(idx) => &hint[..idx],
        None => hint,
    };

    let query = match stem.split_once(ARTIST_TITLE_DELIMITER) {
        Some((left, right)) => NormalizedQuery::new(clean_text(left), clean_text(right)),
        None => NormalizedQuery::new(String::new(), clean_text(stem)),
    };

    trace!(
        target: "matching",
        hint = %hint,
        artist = %query.artist,
        title = %query.title,
        "normalized filename"
    );

    query
}

/// Strip parenthetical annotations and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let without_annotations = PARENTHETICAL.replace_all(text.trim(), "");
    WHITESPACE_RUN
        .replace_all(&without_annotations, " ")
        .trim()
        .to_string()
}
