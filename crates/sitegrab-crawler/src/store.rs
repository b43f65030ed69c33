use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;

use crate::path::MappedPath;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes `bytes` at `target`, creating missing directories. Returns the file path.
pub async fn write(target: &MappedPath, bytes: &[u8]) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(&target.dir)
        .await
        .map_err(|source| StoreError::CreateDir {
            path: target.dir.clone(),
            source,
        })?;

    let path = target.path();
    fs::write(&path, bytes)
        .await
        .map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
