// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Resolution
// ============================================================================

/// Artist/title pair derived from a file name.
///
/// `artist` is empty when the name carried no `" - "` delimiter. `title` is only
/// empty when the whole name was empty after cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub artist: String,
    pub title: String,
}

impl NormalizedQuery {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty()
    }

    /// Free-text query sent to the search service, or `None` when there is nothing to search for.
    pub fn search_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let text = if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.artist, self.title)
        };

        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

pub const SONG_DETAIL_URL_PREFIX: &str = "https://y.qq.com/n/ryqq/songDetail/";

/// Public catalog page for a resolved song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub canonical_url: String,
}

impl ResolvedSource {
    pub fn from_song_id(song_id: &str) -> Self {
        Self {
            canonical_url: format!("{}{}", SONG_DETAIL_URL_PREFIX, song_id),
        }
    }
}

impl std::fmt::Display for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_url)
    }
}

// ============================================================================
// Conversion log
// ============================================================================

pub const CONVERSION_LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the append-only conversion log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionLogEntry {
    pub timestamp: DateTime<Local>,
    pub output_filename: String,
    /// Empty when the source could not be resolved.
    pub source_url: String,
}

impl ConversionLogEntry {
    pub fn new(
        timestamp: DateTime<Local>,
        output_filename: impl Into<String>,
        source_url: Option<String>,
    ) -> Self {
        Self {
            timestamp,
            output_filename: output_filename.into(),
            source_url: source_url.unwrap_or_default(),
        }
    }

    pub fn now(output_filename: impl Into<String>, source_url: Option<String>) -> Self {
        Self::new(Local::now(), output_filename, source_url)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp
            .format(CONVERSION_LOG_TIMESTAMP_FORMAT)
            .to_string()
    }
}

// ============================================================================
// File formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackFormat {
    /// Encrypted FLAC container.
    Mflac,
    /// Encrypted Ogg Vorbis container.
    Mgg,
    Ogg,
    Flac,
    Mp3,
    M4a,
}

impl TrackFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mflac" => Some(Self::Mflac),
            "mgg" => Some(Self::Mgg),
            "ogg" => Some(Self::Ogg),
            "flac" => Some(Self::Flac),
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mflac => "mflac",
            Self::Mgg => "mgg",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Mflac | Self::Mgg)
    }

    /// Plain format an encrypted container decrypts to.
    pub fn decrypted(&self) -> Option<Self> {
        match self {
            Self::Mflac => Some(Self::Flac),
            Self::Mgg => Some(Self::Ogg),
            _ => None,
        }
    }
}

impl std::fmt::Display for TrackFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
