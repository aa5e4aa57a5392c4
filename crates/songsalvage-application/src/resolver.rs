// SPDX-License-Identifier: GPL-3.0-or-later

//! Best-effort lookup of a file's public catalog page.

use crate::filename_heuristics::normalize_filename;
use crate::matching::select_best;
use async_trait::async_trait;
use songsalvage_domain::{NormalizedQuery, ResolvedSource};
use songsalvage_qqmusic::{QqMusicClient, SearchResponse};
use std::sync::Arc;
use tracing::{debug, info};

/// Song search backend used for resolution.
#[async_trait]
pub trait SongSearch: Send + Sync {
    /// `None` when there was nothing to search for or the search failed.
    async fn search(&self, query: &NormalizedQuery, limit: u32) -> Option<SearchResponse>;
}

#[async_trait]
impl SongSearch for QqMusicClient {
    async fn search(&self, query: &NormalizedQuery, limit: u32) -> Option<SearchResponse> {
        QqMusicClient::search(self, query, limit).await
    }
}

/// Resolves file names to song detail URLs.
#[derive(Clone)]
pub struct SourceResolver {
    search: Arc<dyn SongSearch>,
    limit: u32,
}

impl SourceResolver {
    pub fn new(search: Arc<dyn SongSearch>, limit: u32) -> Self {
        Self { search, limit }
    }

    /// Guess the catalog URL for a file name.
    pub async fn guess_source_url(&self, filename: &str) -> Option<String> {
        self.resolve(filename)
            .await
            .map(|source| source.canonical_url)
    }

    pub async fn resolve(&self, filename: &str) -> Option<ResolvedSource> {
        let query = normalize_filename(filename);
        let response = self.search.search(&query, self.limit).await;
        let decision = select_best(response.as_ref(), &query)?;

        debug!(
            target: "resolver",
            filename,
            song_id = %decision.song_id,
            strength = ?decision.strength,
            "resolved source"
        );

        Some(ResolvedSource::from_song_id(&decision.song_id))
    }

    /// Try the original name first, then the produced output name.
    pub async fn resolve_either(&self, original: &str, output: &str) -> Option<String> {
        let url = match self.guess_source_url(original).await {
            Some(url) => Some(url),
            None => self.guess_source_url(output).await,
        };

        match &url {
            Some(url) => info!(target: "resolver", "source: {}", url),
            None => info!(target: "resolver", "source not found (retry later): {}", output),
        }

        url
    }
}
