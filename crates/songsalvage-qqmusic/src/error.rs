// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QqMusicError>;

#[derive(Debug, Error)]
pub enum QqMusicError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid search URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response from QQ Music search: {0}")]
    InvalidResponse(String),

    #[error("API error: {status}")]
    ApiError { status: u16 },
}
