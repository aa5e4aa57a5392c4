// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{QqMusicError, Result};
use crate::models::{SearchQuery, SearchResponse};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use reqwest::Client;
use songsalvage_domain::NormalizedQuery;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const QQ_MUSIC_SEARCH_URL: &str = "https://c.y.qq.com/soso/fcgi-bin/client_search_cp";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
const DEFAULT_REFERER: &str = "https://y.qq.com/";
const DEFAULT_ORIGIN: &str = "https://y.qq.com";

/// QQ Music song search client.
#[derive(Debug, Clone)]
pub struct QqMusicClient {
    client: Client,
    base_url: String,
}

impl QqMusicClient {
    /// Create a new client with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a client builder for custom configuration.
    pub fn builder() -> QqMusicClientBuilder {
        QqMusicClientBuilder::default()
    }

    /// Search for songs.
    ///
    /// # Example
    /// ```no_run
    /// # use songsalvage_qqmusic::{QqMusicClient, SearchQuery};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = QqMusicClient::new()?;
    /// let response = client.search_songs(&SearchQuery::new("周杰伦 晴天")).await?;
    /// let songs = response.song_list().unwrap_or_default();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search_songs(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| QqMusicError::InvalidUrl(e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("p", &query.page.to_string())
            .append_pair("n", &query.limit.to_string())
            .append_pair("w", &query.text);

        self.get(url).await
    }

    /// Search for the songs matching a file name's artist/title pair.
    ///
    /// Returns `None` without touching the network when the query is empty, and
    /// `None` on any transport, status or decoding failure.
    pub async fn search(&self, query: &NormalizedQuery, limit: u32) -> Option<SearchResponse> {
        let text = query.search_text()?;

        match self.search_songs(&SearchQuery::new(text).limit(limit)).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(target: "qqmusic", error = %e, "search failed");
                None
            }
        }
    }

    async fn get(&self, url: Url) -> Result<SearchResponse> {
        trace!(target: "qqmusic", "GET {}", url);

        let response = self.client.get(url).send().await.map_err(map_send_error)?;

        let status = response.status();
        debug!(target: "qqmusic", "response status: {}", status);

        if !status.is_success() {
            return Err(QqMusicError::ApiError {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(map_send_error)?;
        let body = decode_lenient(&bytes);
        trace!(target: "qqmusic", "response body: {}", body);

        serde_json::from_str(&body)
            .map(SearchResponse::new)
            .map_err(|e| QqMusicError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

fn map_send_error(e: reqwest::Error) -> QqMusicError {
    if e.is_timeout() {
        QqMusicError::Timeout
    } else {
        QqMusicError::RequestFailed(e)
    }
}

/// UTF-8 decode that drops undecodable bytes instead of failing.
fn decode_lenient(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Builder for configuring a QQ Music client.
#[derive(Debug)]
pub struct QqMusicClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    referer: String,
    origin: String,
}

impl Default for QqMusicClientBuilder {
    fn default() -> Self {
        Self {
            base_url: QQ_MUSIC_SEARCH_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl QqMusicClientBuilder {
    /// Set a custom search endpoint (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout duration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Build the QQ Music client.
    pub fn build(self) -> Result<QqMusicClient> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, header_value(&self.referer)?);
        headers.insert(ORIGIN, header_value(&self.origin)?);

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(QqMusicClient {
            client,
            base_url: self.base_url,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| QqMusicError::InvalidUrl(format!("invalid header value {:?}: {}", value, e)))
}
