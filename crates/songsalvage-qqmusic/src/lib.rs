// SPDX-License-Identifier: GPL-3.0-or-later

//! Client for the QQ Music song search endpoint.
//!
//! The search service is used to resolve a local file back to its public
//! catalog page. Requests are plain GETs that must carry browser-like
//! `User-Agent`, `Referer` and `Origin` headers or the service refuses them.

pub mod client;
#[cfg(test)]
mod client_tests;
pub mod error;
pub mod models;

pub use client::{QqMusicClient, QqMusicClientBuilder};
pub use error::{QqMusicError, Result};
pub use models::{SearchQuery, SearchResponse, Singer, SongCandidate};
