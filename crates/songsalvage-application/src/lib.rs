// SPDX-License-Identifier: GPL-3.0-or-later
use songsalvage_config::AppConfig;
use songsalvage_qqmusic::{QqMusicClient, QqMusicError};
use std::sync::Arc;
use std::time::Duration;

pub mod conversion_log;
pub mod decrypt;
pub mod filename_heuristics;
pub mod library;
pub mod matching;
pub mod resolver;
pub mod transcode;

pub use conversion_log::{ConversionLog, ConversionLogError, CsvConversionLog};
pub use decrypt::{DecryptBatch, DecryptError, DecryptSummary, Decryptor, ExternalHelperDecryptor};
pub use filename_heuristics::normalize_filename;
pub use library::{default_download_dir, list_downloads, LibraryError};
pub use matching::{select_best, MatchDecision, MatchStrength};
pub use resolver::{SongSearch, SourceResolver};
pub use transcode::{FfmpegTranscoder, TranscodeBatch, TranscodeError, TranscodeSummary, Transcoder};

use tracing::info;

/// Configuration plus the services built from it.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn on_start(&self) {
        info!(target: "application", "application state initialized");
    }

    pub fn search_client(&self) -> Result<QqMusicClient, QqMusicError> {
        let search = &self.config.search;
        QqMusicClient::builder()
            .base_url(&search.base_url)
            .timeout(Duration::from_secs(search.timeout_secs))
            .user_agent(&search.user_agent)
            .referer(&search.referer)
            .origin(&search.origin)
            .build()
    }

    pub fn resolver(&self) -> Result<SourceResolver, QqMusicError> {
        Ok(SourceResolver::new(
            Arc::new(self.search_client()?),
            self.config.search.limit,
        ))
    }

    pub fn conversion_log(&self) -> Arc<dyn ConversionLog> {
        Arc::new(CsvConversionLog::new(&self.config.conversion_log.path))
    }

    pub fn transcode_batch(&self) -> Result<TranscodeBatch, QqMusicError> {
        Ok(TranscodeBatch::new(
            Arc::new(FfmpegTranscoder::new(self.config.transcode.clone())),
            self.resolver()?,
            self.conversion_log(),
        ))
    }

    pub fn decrypt_batch(&self) -> anyhow::Result<DecryptBatch> {
        let decryptor = ExternalHelperDecryptor::from_config(&self.config.decrypt)?;
        Ok(DecryptBatch::new(
            Arc::new(decryptor),
            self.resolver()?,
            self.conversion_log(),
        ))
    }
}
