// SPDX-License-Identifier: GPL-3.0-or-later

//! Candidate selection for source resolution.
//!
//! Search results are scanned in service order. A candidate whose name contains
//! the title and whose singers contain the artist wins immediately. Otherwise the
//! first candidate matching on title or artist alone is kept, and failing that
//! the first candidate carrying an identifier.

use songsalvage_domain::NormalizedQuery;
use songsalvage_qqmusic::{SearchResponse, SongCandidate};
use tracing::debug;

/// How a selected candidate relates to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    /// Title matched, and artist matched or was not given.
    Strong,
    /// Title or artist matched, not both.
    Partial,
    /// Nothing matched; first candidate with an identifier.
    Fallback,
}

/// Outcome of candidate selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecision {
    pub song_id: String,
    pub strength: MatchStrength,
}

/// Lower-cased query terms, compared against each candidate.
struct QueryTerms {
    artist: String,
    title: String,
}

impl QueryTerms {
    fn new(query: &NormalizedQuery) -> Self {
        Self {
            artist: query.artist.to_lowercase(),
            title: query.title.to_lowercase(),
        }
    }

    /// An empty title never matches.
    fn name_matches(&self, song: &SongCandidate) -> bool {
        !self.title.is_empty() && song.song_name().to_lowercase().contains(&self.title)
    }

    /// An empty artist never matches; see [`QueryTerms::artist_satisfied`].
    fn artist_matches(&self, song: &SongCandidate) -> bool {
        !self.artist.is_empty() && song.singer_names().to_lowercase().contains(&self.artist)
    }

    /// Artist constraint for a strong match: trivially met when no artist was given.
    fn artist_satisfied(&self, song: &SongCandidate) -> bool {
        self.artist.is_empty() || self.artist_matches(song)
    }
}

/// Pick the best candidate identifier from a search response.
///
/// Missing results or a response without a candidate list yield `None`.
pub fn select_best(
    results: Option<&SearchResponse>,
    query: &NormalizedQuery,
) -> Option<MatchDecision> {
    let songs = match results.and_then(SearchResponse::song_list) {
        Some(songs) => songs,
        None => {
            debug!(target: "matching", "no candidate list in search response");
            return None;
        }
    };

    select_from_candidates(&songs, query)
}

/// Pick the best candidate identifier from an ordered candidate list.
pub fn select_from_candidates(
    songs: &[SongCandidate],
    query: &NormalizedQuery,
) -> Option<MatchDecision> {
    let terms = QueryTerms::new(query);

    // Each slot is written at most once.
    let mut partial: Option<&str> = None;
    let mut fallback: Option<&str> = None;

    for song in songs {
        let Some(song_id) = song.song_id() else {
            continue;
        };

        let name_match = terms.name_matches(song);

        if name_match && terms.artist_satisfied(song) {
            debug!(target: "matching", song_id, song = song.song_name(), "strong match");
            return Some(MatchDecision {
                song_id: song_id.to_string(),
                strength: MatchStrength::Strong,
            });
        }

        if partial.is_none() && (name_match || terms.artist_matches(song)) {
            partial = Some(song_id);
        }

        if fallback.is_none() {
            fallback = Some(song_id);
        }
    }

    let decision = partial
        .map(|id| (id, MatchStrength::Partial))
        .or_else(|| fallback.map(|id| (id, MatchStrength::Fallback)))
        .map(|(id, strength)| MatchDecision {
            song_id: id.to_string(),
            strength,
        });

    debug!(
        target: "matching",
        candidates = songs.len(),
        decision = ?decision,
        "no strong match"
    );

    decision
}
