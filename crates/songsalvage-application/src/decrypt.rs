// SPDX-License-Identifier: GPL-3.0-or-later

//! Batch recovery of encrypted downloads (`.mflac`, `.mgg`).
//!
//! Decryption itself is delegated to a [`Decryptor`]. The batch copies each
//! source into a private staging directory under a hashed name, decrypts it
//! there and moves the result into the output directory, so neither the
//! original file nor a half-written output is ever exposed.

use crate::conversion_log::ConversionLog;
use crate::library::{file_name_lossy, find_tracks, LibraryError};
use crate::resolver::SourceResolver;
use crate::transcode::output_file_name;
use async_trait::async_trait;
use songsalvage_config::DecryptConfig;
use songsalvage_domain::{ConversionLogEntry, TrackFormat};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

pub const STAGING_DIR_PREFIX: &str = "songsalvage_";

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("No decryption helper configured")]
    HelperNotConfigured,

    #[error("Decryption helper not found at path: {path}")]
    HelperNotFound { path: PathBuf },

    #[error("Decryption failed: {reason}")]
    Failed { reason: String },

    #[error("Decryption timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DecryptResult<T> = Result<T, DecryptError>;

/// Turns one encrypted file into its plain counterpart.
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(&self, src: &Path, dst: &Path) -> DecryptResult<()>;
}

/// Delegates to an external helper program invoked as `<helper> <src> <dst>`.
pub struct ExternalHelperDecryptor {
    helper_path: PathBuf,
    timeout_secs: u64,
}

impl ExternalHelperDecryptor {
    pub fn new(helper_path: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            helper_path: helper_path.into(),
            timeout_secs,
        }
    }

    pub fn from_config(config: &DecryptConfig) -> DecryptResult<Self> {
        let helper = config
            .helper_path
            .as_ref()
            .ok_or(DecryptError::HelperNotConfigured)?;
        Ok(Self::new(helper, config.timeout_secs))
    }
}

#[async_trait]
impl Decryptor for ExternalHelperDecryptor {
    #[instrument(skip_all, fields(src = %src.display()))]
    async fn decrypt(&self, src: &Path, dst: &Path) -> DecryptResult<()> {
        let child = Command::new(&self.helper_path)
            .arg(src)
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DecryptError::HelperNotFound {
                        path: self.helper_path.clone(),
                    }
                } else {
                    DecryptError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| DecryptError::Timeout {
            timeout_secs: self.timeout_secs,
        })??;

        if output.status.success() && dst.exists() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(DecryptError::Failed {
            reason: if stderr.is_empty() {
                format!("helper exited with {}", output.status)
            } else {
                stderr
            },
        })
    }
}

/// Counters reported at the end of a decrypt batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptSummary {
    pub found: usize,
    pub decrypted: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct DecryptBatch {
    decryptor: Arc<dyn Decryptor>,
    resolver: SourceResolver,
    log: Arc<dyn ConversionLog>,
}

impl DecryptBatch {
    pub fn new(
        decryptor: Arc<dyn Decryptor>,
        resolver: SourceResolver,
        log: Arc<dyn ConversionLog>,
    ) -> Self {
        Self {
            decryptor,
            resolver,
            log,
        }
    }

    /// Decrypt every encrypted file under `input_dir` into `output_dir`.
    ///
    /// Files whose output already exists are not decrypted again, but their
    /// source is still resolved and logged.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> DecryptResult<DecryptSummary> {
        let inputs = find_tracks(input_dir, |format| format.is_encrypted())?;

        tokio::fs::create_dir_all(output_dir).await?;

        // Removed on drop, including on early return.
        let staging = tempfile::Builder::new()
            .prefix(STAGING_DIR_PREFIX)
            .tempdir()?;

        let mut summary = DecryptSummary::default();
        for (src, format) in inputs {
            summary.found += 1;
            let Some(plain) = format.decrypted() else {
                continue;
            };

            let file_name = file_name_lossy(&src);
            let output_name = output_file_name(&src, plain);
            let dst = output_dir.join(&output_name);

            info!(target: "decrypt", "decrypting: {}", file_name);

            if dst.exists() {
                info!(target: "decrypt", "already exists, skipping: {}", dst.display());
                summary.skipped += 1;
                self.record(&file_name, &output_name).await;
                continue;
            }

            match self
                .decrypt_staged(staging.path(), &src, &file_name, format, plain, &dst)
                .await
            {
                Ok(()) => {
                    info!(target: "decrypt", "decrypted: {}", dst.display());
                    summary.decrypted += 1;
                    self.record(&file_name, &output_name).await;
                }
                Err(e) => {
                    error!(target: "decrypt", "decryption failed: {} -> {}", file_name, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            target: "decrypt",
            found = summary.found,
            decrypted = summary.decrypted,
            skipped = summary.skipped,
            failed = summary.failed,
            "all tasks finished"
        );
        Ok(summary)
    }

    async fn decrypt_staged(
        &self,
        staging: &Path,
        src: &Path,
        file_name: &str,
        format: TrackFormat,
        plain: TrackFormat,
        dst: &Path,
    ) -> DecryptResult<()> {
        let staged_stem = staged_stem(file_name);
        let staged_src = staging.join(format!("{}.{}", staged_stem, format.extension()));
        let staged_dst = staging.join(format!("{}.{}", staged_stem, plain.extension()));

        tokio::fs::copy(src, &staged_src).await?;

        let result = match self.decryptor.decrypt(&staged_src, &staged_dst).await {
            Ok(()) => move_file(&staged_dst, dst).await,
            Err(e) => Err(e),
        };

        if result.is_err() && staged_dst.exists() {
            if let Err(e) = tokio::fs::remove_file(&staged_dst).await {
                warn!(target: "decrypt", error = %e, "failed to remove staged output");
            }
        }
        let _ = tokio::fs::remove_file(&staged_src).await;

        result
    }

    async fn record(&self, file_name: &str, output_name: &str) {
        let url = self.resolver.resolve_either(file_name, output_name).await;
        if let Err(e) = self.log.append(&ConversionLogEntry::now(output_name, url)) {
            warn!(target: "decrypt", error = %e, "failed to append conversion log");
        }
    }
}

/// Hex MD5 of the file name, used to stage files under an ASCII-only name.
pub fn staged_stem(file_name: &str) -> String {
    format!("{:x}", md5::compute(file_name.as_bytes()))
}

/// Rename, falling back to copy and delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> DecryptResult<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}
