//! Where exported briefs land.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub const JSON_FILE: &str = "brief.json";
pub const CSV_FILE: &str = "brief.csv";
/// Written when the backend answers with a non-success status.
pub const FALLBACK_FILE: &str = "brief-fallback.json";
/// Written when the backend could not be reached at all.
pub const OFFLINE_FILE: &str = "brief-offline.json";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode download: {0}")]
    Encode(String),
}

/// Receives downloadable files.
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, filename: &str, contents: &str) -> Result<PathBuf, DownloadError>;
}

/// Writes downloads into a directory, replacing files of the same name.
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DownloadDir {
    fn deliver(&self, filename: &str, contents: &str) -> Result<PathBuf, DownloadError> {
        let path = self.dir.join(filename);
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, contents))
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), bytes = contents.len(), "download written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DownloadDir::new(tmp.path().join("out"));
        let path = sink.deliver(CSV_FILE, "a,b").unwrap();
        assert_eq!(path, tmp.path().join("out").join("brief.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b");
    }

    #[test]
    fn reports_unwritable_dir() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let sink = DownloadDir::new(tmp.path());
        assert!(matches!(
            sink.deliver(JSON_FILE, "{}"),
            Err(DownloadError::Write { .. })
        ));
    }
}
