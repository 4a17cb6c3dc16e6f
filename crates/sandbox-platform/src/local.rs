use std::path::Path;

use anyhow::Result;

/// Whole-file access to the host filesystem, used for uploads and downloads.
pub trait LocalFs: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
}
