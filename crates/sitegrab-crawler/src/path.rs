use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// File name used for URLs whose path ends with a `/`.
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum PathError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Storage location of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappedPath {
    pub dir: PathBuf,
    pub filename: String,
}

impl MappedPath {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

/// Maps page URLs to `base_dir/<host>/<path directory>/<path basename>`.
#[derive(Debug, Clone)]
pub struct PathMapper {
    base_dir: PathBuf,
}

impl PathMapper {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn map(&self, url: &str) -> Result<MappedPath, PathError> {
        let invalid = |reason: String| PathError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        let host = host_key(&parsed).ok_or_else(|| invalid("no host".into()))?;

        let mut dir = self.base_dir.join(host);
        let mut segments = parsed
            .path_segments()
            .map(|s| s.collect::<Vec<_>>())
            .unwrap_or_default();

        let filename = match segments.pop() {
            Some(last) if !last.is_empty() => last.to_string(),
            _ => INDEX_FILE.to_string(),
        };
        for segment in segments.into_iter().filter(|s| !s.is_empty()) {
            dir.push(segment);
        }

        Ok(MappedPath { dir, filename })
    }
}

/// Host of a URL with its explicit port if any, e.g. `example.com` or `127.0.0.1:8080`.
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Same as [`host_key`] for an unparsed URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(host_key)
}
