// SPDX-License-Identifier: GPL-3.0-or-later

//! OGG to FLAC batch conversion through an external encoder.

use crate::conversion_log::ConversionLog;
use crate::library::{file_name_lossy, find_tracks, LibraryError};
use crate::resolver::SourceResolver;
use async_trait::async_trait;
use songsalvage_config::TranscodeConfig;
use songsalvage_domain::{ConversionLogEntry, TrackFormat};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Encoder not found at path: {path}")]
    EncoderNotFound { path: PathBuf },

    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Encoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// Converts one audio file into another format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Checks that the encoder can be run.
    async fn validate(&self) -> TranscodeResult<()>;

    async fn transcode(&self, src: &Path, dst: &Path) -> TranscodeResult<()>;
}

/// FLAC encoding via the `ffmpeg` binary.
pub struct FfmpegTranscoder {
    config: TranscodeConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    fn build_args(src: &Path, dst: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            src.to_string_lossy().to_string(),
            "-c:a".to_string(),
            "flac".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            dst.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::EncoderNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscodeError::Io(e)
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn validate(&self) -> TranscodeResult<()> {
        let probe = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        let status = timeout(Duration::from_secs(self.config.probe_timeout_secs), probe)
            .await
            .map_err(|_| TranscodeError::EncoderNotFound {
                path: self.config.ffmpeg_path.clone(),
            })?
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(TranscodeError::EncoderNotFound {
                path: self.config.ffmpeg_path.clone(),
            });
        }
        Ok(())
    }

    #[instrument(skip_all, fields(src = %src.display()))]
    async fn transcode(&self, src: &Path, dst: &Path) -> TranscodeResult<()> {
        if !src.exists() {
            return Err(TranscodeError::InputNotFound(src.to_path_buf()));
        }

        if let Some(parent) = dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let child = Command::new(&self.config.ffmpeg_path)
            .args(Self::build_args(src, dst))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = timeout(
            Duration::from_secs(self.config.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| TranscodeError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })??;

        if output.status.success() && dst.exists() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(TranscodeError::EncodingFailed {
            reason: if stderr.is_empty() {
                format!("encoder exited with {}", output.status)
            } else {
                stderr
            },
        })
    }
}

/// Counters reported at the end of a transcode batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub found: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Converts every `.ogg` under a directory into `.flac` files in a flat output directory.
pub struct TranscodeBatch {
    transcoder: Arc<dyn Transcoder>,
    resolver: SourceResolver,
    log: Arc<dyn ConversionLog>,
}

impl TranscodeBatch {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        resolver: SourceResolver,
        log: Arc<dyn ConversionLog>,
    ) -> Self {
        Self {
            transcoder,
            resolver,
            log,
        }
    }

    /// Existing outputs are skipped. When `record_log` is set, each converted
    /// file's source is resolved and appended to the conversion log.
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        record_log: bool,
    ) -> TranscodeResult<TranscodeSummary> {
        self.transcoder.validate().await?;

        let inputs = find_tracks(input_dir, |format| format == TrackFormat::Ogg)?;

        if !output_dir.exists() {
            tokio::fs::create_dir_all(output_dir).await?;
            info!(target: "transcode", "created output directory: {}", output_dir.display());
        }

        info!(target: "transcode", "scanning directory: {}", input_dir.display());

        let mut summary = TranscodeSummary::default();
        for (src, _) in inputs {
            summary.found += 1;
            let file_name = file_name_lossy(&src);
            info!(target: "transcode", "[{}] found OGG file: {}", summary.found, file_name);

            let output_name = output_file_name(&src, TrackFormat::Flac);
            let dst = output_dir.join(&output_name);

            if dst.exists() {
                info!(target: "transcode", "  FLAC already exists, skipping: {}", output_name);
                summary.skipped += 1;
                continue;
            }

            match self.transcoder.transcode(&src, &dst).await {
                Ok(()) => {
                    info!(target: "transcode", "converted: {}", output_name);
                    summary.converted += 1;
                    if record_log {
                        let url = self.resolver.resolve_either(&file_name, &output_name).await;
                        if let Err(e) = self.log.append(&ConversionLogEntry::now(&output_name, url)) {
                            warn!(target: "transcode", error = %e, "failed to append conversion log");
                        }
                    }
                }
                Err(e) => {
                    error!(target: "transcode", "conversion failed: {} -> {}", src.display(), e);
                    summary.failed += 1;
                }
            }
        }

        log_summary(&summary);
        Ok(summary)
    }
}

/// `<stem>.<format>` for a source path.
pub fn output_file_name(src: &Path, format: TrackFormat) -> String {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.{}", stem, format.extension())
}

fn log_summary(summary: &TranscodeSummary) {
    info!(target: "transcode", "{}", "=".repeat(60));
    info!(target: "transcode", "conversion finished:");
    info!(target: "transcode", "  OGG files found: {}", summary.found);
    info!(target: "transcode", "  converted: {}", summary.converted);
    info!(target: "transcode", "  skipped (already exist): {}", summary.skipped);
    info!(target: "transcode", "  failed: {}", summary.failed);
    info!(target: "transcode", "{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion_log::ConversionLogResult;
    use crate::resolver::SongSearch;
    use serde_json::json;
    use songsalvage_domain::NormalizedQuery;
    use songsalvage_qqmusic::SearchResponse;
    use std::sync::Mutex;

    /// Copies input to output, failing for names containing "broken".
    struct CopyTranscoder;

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn validate(&self) -> TranscodeResult<()> {
            Ok(())
        }

        async fn transcode(&self, src: &Path, dst: &Path) -> TranscodeResult<()> {
            if src.to_string_lossy().contains("broken") {
                return Err(TranscodeError::EncodingFailed {
                    reason: "corrupt stream".to_string(),
                });
            }
            tokio::fs::copy(src, dst).await?;
            Ok(())
        }
    }

    struct MissingEncoder;

    #[async_trait]
    impl Transcoder for MissingEncoder {
        async fn validate(&self) -> TranscodeResult<()> {
            Err(TranscodeError::EncoderNotFound {
                path: PathBuf::from("ffmpeg"),
            })
        }

        async fn transcode(&self, _src: &Path, _dst: &Path) -> TranscodeResult<()> {
            unreachable!("validate fails first")
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl SongSearch for FixedSearch {
        async fn search(&self, _query: &NormalizedQuery, _limit: u32) -> Option<SearchResponse> {
            Some(SearchResponse::new(json!({
                "data": { "song": { "list": [{ "songname": "x", "songmid": "MID" }] } }
            })))
        }
    }

    #[derive(Default)]
    struct MemoryLog(Mutex<Vec<ConversionLogEntry>>);

    impl ConversionLog for MemoryLog {
        fn append(&self, entry: &ConversionLogEntry) -> ConversionLogResult<()> {
            self.0.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn batch(transcoder: Arc<dyn Transcoder>, log: Arc<MemoryLog>) -> TranscodeBatch {
        TranscodeBatch::new(
            transcoder,
            SourceResolver::new(Arc::new(FixedSearch), 5),
            log,
        )
    }

    #[tokio::test]
    async fn converts_skips_and_counts_failures() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(input.path().join("album")).unwrap();
        std::fs::write(input.path().join("album/A - One.ogg"), b"one").unwrap();
        std::fs::write(input.path().join("B - Two.OGG"), b"two").unwrap();
        std::fs::write(input.path().join("broken.ogg"), b"bad").unwrap();
        std::fs::write(input.path().join("ignored.mp3"), b"mp3").unwrap();
        std::fs::write(output.path().join("B - Two.flac"), b"done").unwrap();

        let log = Arc::new(MemoryLog::default());
        let summary = batch(Arc::new(CopyTranscoder), log.clone())
            .run(input.path(), output.path(), true)
            .await
            .unwrap();

        assert_eq!(
            summary,
            TranscodeSummary {
                found: 3,
                converted: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(std::fs::read(output.path().join("A - One.flac")).unwrap(), b"one");

        let entries = log.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].output_filename, "A - One.flac");
        assert_eq!(entries[0].source_url, "https://y.qq.com/n/ryqq/songDetail/MID");
    }

    #[tokio::test]
    async fn no_log_entries_when_recording_disabled() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("song.ogg"), b"x").unwrap();

        let log = Arc::new(MemoryLog::default());
        let summary = batch(Arc::new(CopyTranscoder), log.clone())
            .run(input.path(), &output.path().join("new"), false)
            .await
            .unwrap();

        assert_eq!(summary.converted, 1);
        assert!(output.path().join("new/song.flac").exists());
        assert!(log.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_encoder_stops_before_scanning() {
        let output = tempfile::tempdir().unwrap();
        let result = batch(Arc::new(MissingEncoder), Arc::new(MemoryLog::default()))
            .run(Path::new("/definitely/not/here"), output.path(), true)
            .await;

        assert!(matches!(result, Err(TranscodeError::EncoderNotFound { .. })));
    }

    #[tokio::test]
    async fn missing_input_directory_is_reported() {
        let output = tempfile::tempdir().unwrap();
        let result = batch(Arc::new(CopyTranscoder), Arc::new(MemoryLog::default()))
            .run(&output.path().join("missing"), output.path(), true)
            .await;

        assert!(matches!(
            result,
            Err(TranscodeError::Library(LibraryError::DirectoryNotFound(_)))
        ));
    }

    #[test]
    fn ffmpeg_arguments() {
        let args = FfmpegTranscoder::build_args(Path::new("in.ogg"), Path::new("out.flac"));
        assert_eq!(
            args,
            vec!["-i", "in.ogg", "-c:a", "flac", "-y", "-loglevel", "error", "out.flac"]
        );
    }

    #[tokio::test]
    async fn missing_ffmpeg_binary_fails_validation() {
        let transcoder = FfmpegTranscoder::new(TranscodeConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg-songsalvage"),
            ..TranscodeConfig::default()
        });

        assert!(matches!(
            transcoder.validate().await,
            Err(TranscodeError::EncoderNotFound { .. })
        ));
    }

    #[test]
    fn output_name_replaces_extension() {
        assert_eq!(
            output_file_name(Path::new("/x/周杰伦 - 晴天.ogg"), TrackFormat::Flac),
            "周杰伦 - 晴天.flac"
        );
    }
}
