// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub base_url: String,
    pub limit: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub referer: String,
    pub origin: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://c.y.qq.com/soso/fcgi-bin/client_search_cp".to_string(),
            limit: 5,
            timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            referer: "https://y.qq.com/".to_string(),
            origin: "https://y.qq.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionLogConfig {
    pub path: PathBuf,
}

impl Default for ConversionLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("conversion_log.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    pub ffmpeg_path: PathBuf,
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeout_secs: 300,
            probe_timeout_secs: 5,
        }
    }
}

/// The decryption helper is an external program called as `<helper> <src> <dst>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptConfig {
    pub helper_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for DecryptConfig {
    fn default() -> Self {
        Self {
            helper_path: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LibraryConfig {
    /// Falls back to `~/Music/VipSongsDownload` when unset.
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub conversion_log: ConversionLogConfig,
    pub transcode: TranscodeConfig,
    pub decrypt: DecryptConfig,
    pub library: LibraryConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: SONGSALVAGE_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("SONGSALVAGE_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
