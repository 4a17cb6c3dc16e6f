use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sandbox_platform::LocalFs;
use tracing::debug;

/// `LocalFs` backed by the machine the client runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFileSystem;

impl HostFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl LocalFs for HostFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let data = fs::read(path)
            .with_context(|| format!("failed to read file {}", path.display()))?;
        debug!("read {} bytes from {}", data.len(), path.display());
        Ok(data)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent dirs for {}", path.display()))?;
        }
        fs::write(path, data)
            .with_context(|| format!("failed to write file {}", path.display()))?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
