// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of candidates requested per search.
pub const DEFAULT_LIMIT: u32 = 5;

/// Search query parameters.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Free-text query (`w`).
    pub text: String,
    /// Page index (`p`), 1-based.
    pub page: u32,
    /// Maximum number of results (`n`).
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Decoded search response, kept as raw JSON.
///
/// The service does not document its payload, so nothing is assumed about it
/// until the candidate list is requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse(pub Value);

impl SearchResponse {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Candidates found at `data.song.list`.
    ///
    /// Returns `None` when the path is missing or is not an array. Entries that
    /// are not song objects are dropped.
    pub fn song_list(&self) -> Option<Vec<SongCandidate>> {
        let list = self.0.pointer("/data/song/list")?.as_array()?;
        Some(
            list.iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
        )
    }
}

/// Song entry in a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongCandidate {
    #[serde(default)]
    pub songname: Option<String>,
    #[serde(default)]
    pub singer: Option<Vec<Singer>>,
    #[serde(default)]
    pub songmid: Option<String>,
    #[serde(default)]
    pub mid: Option<String>,
}

/// Singer credited on a song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Singer {
    #[serde(default)]
    pub name: Option<String>,
}

impl SongCandidate {
    pub fn song_name(&self) -> &str {
        self.songname.as_deref().unwrap_or_default()
    }

    /// Catalog identifier, `songmid` preferred over `mid`. Empty strings count as missing.
    pub fn song_id(&self) -> Option<&str> {
        self.songmid
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.mid.as_deref().filter(|id| !id.is_empty()))
    }

    /// All singer names joined by a single space.
    pub fn singer_names(&self) -> String {
        self.singer
            .iter()
            .flatten()
            .map(|singer| singer.name.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
