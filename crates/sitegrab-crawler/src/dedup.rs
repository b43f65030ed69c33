use std::path::Path;

use crate::path::PathMapper;

/// Tells whether a page is already on disk.
///
/// The check is advisory: two runs sharing a base directory may both decide to download the
/// same page.
#[derive(Debug, Clone)]
pub struct DedupStore {
    mapper: PathMapper,
}

impl DedupStore {
    pub fn new(mapper: PathMapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Returns `false` only when a file exists at the mapped path of `url`.
    ///
    /// URLs that cannot be mapped return `true`, the caller drops them on its own.
    pub fn should_download(&self, url: &str) -> bool {
        match self.mapper.map(url) {
            Ok(mapped) => !is_file(&mapped.path()),
            Err(_) => true,
        }
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
