// SPDX-License-Identifier: GPL-3.0-or-later

//! Append-only CSV record of produced files and their resolved sources.

use songsalvage_domain::ConversionLogEntry;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONVERSION_LOG_HEADER: [&str; 3] = ["转换时间", "歌曲", "来源链接"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ConversionLogError {
    #[error("I/O error writing conversion log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ConversionLogResult<T> = Result<T, ConversionLogError>;

/// Destination for conversion log entries.
pub trait ConversionLog: Send + Sync {
    fn append(&self, entry: &ConversionLogEntry) -> ConversionLogResult<()>;
}

/// CSV file log. The file is opened and closed on every append.
#[derive(Debug, Clone)]
pub struct CsvConversionLog {
    path: PathBuf,
}

impl CsvConversionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConversionLogError {
        ConversionLogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConversionLog for CsvConversionLog {
    fn append(&self, entry: &ConversionLogEntry) -> ConversionLogResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        let is_new = file.metadata().map_err(|e| self.io_error(e))?.len() == 0;
        if is_new {
            file.write_all(UTF8_BOM).map_err(|e| self.io_error(e))?;
        }

        let mut writer = csv::Writer::from_writer(file);
        if is_new {
            writer.write_record(CONVERSION_LOG_HEADER)?;
        }
        writer.write_record([
            entry.formatted_timestamp().as_str(),
            entry.output_filename.as_str(),
            entry.source_url.as_str(),
        ])?;
        writer.flush().map_err(|e| self.io_error(e))?;

        debug!(
            target: "conversion_log",
            path = %self.path.display(),
            song = %entry.output_filename,
            "appended conversion log entry"
        );
        Ok(())
    }
}
