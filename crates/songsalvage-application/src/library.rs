// SPDX-License-Identifier: GPL-3.0-or-later

//! Discovery of music files on disk.

use songsalvage_domain::TrackFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Folder the desktop client downloads protected tracks into, relative to the home directory.
pub const DEFAULT_DOWNLOAD_SUBDIR: [&str; 2] = ["Music", "VipSongsDownload"];

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Home directory could not be determined")]
    NoHomeDirectory,
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Default download directory of the desktop client.
pub fn default_download_dir() -> LibraryResult<PathBuf> {
    let home = dirs::home_dir().ok_or(LibraryError::NoHomeDirectory)?;
    Ok(DEFAULT_DOWNLOAD_SUBDIR
        .iter()
        .fold(home, |path, segment| path.join(segment)))
}

/// Recursively collect files under `root` whose format passes `accept`.
///
/// Entries are visited in file-name order within each directory. Unreadable
/// entries are logged and skipped.
pub fn find_tracks(
    root: &Path,
    accept: impl Fn(TrackFormat) -> bool,
) -> LibraryResult<Vec<(PathBuf, TrackFormat)>> {
    if !root.is_dir() {
        return Err(LibraryError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(target: "library", error = %e, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(format) = TrackFormat::from_path(entry.path()) {
            if accept(format) {
                found.push((entry.into_path(), format));
            }
        }
    }

    Ok(found)
}

/// Every known music file under the download directory, as paths relative to it.
pub fn list_downloads(download_dir: &Path) -> LibraryResult<Vec<PathBuf>> {
    info!(target: "library", "download directory: {}", download_dir.display());

    let tracks = find_tracks(download_dir, |_| true)?;
    let relative: Vec<PathBuf> = tracks
        .into_iter()
        .map(|(path, _)| {
            path.strip_prefix(download_dir)
                .map(Path::to_path_buf)
                .unwrap_or(path)
        })
        .collect();

    info!(target: "library", "found {} files", relative.len());
    Ok(relative)
}

/// File name component as UTF-8 (lossy).
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
