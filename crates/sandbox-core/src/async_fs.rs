//! Async adapter over [`SandboxFilesystem`].
//!
//! Each operation runs the synchronous implementation on tokio's blocking
//! pool and awaits it, so results and errors are exactly those of the sync
//! facade. Nothing is cancelled once dispatched; dropping the future only
//! stops waiting for it.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::SandboxConfig;
use crate::content::{Encoding, FileContent, WriteEntry};
use crate::error::{FsError, Result};
use crate::filesystem::SandboxFilesystem;
use crate::handle::{AsyncFileHandle, OpenMode};

#[derive(Clone)]
pub struct AsyncSandboxFilesystem {
    inner: SandboxFilesystem,
}

impl AsyncSandboxFilesystem {
    pub fn new(inner: SandboxFilesystem) -> Self {
        Self { inner }
    }

    /// Adapter over an HTTP client for the sandbox described by `config`.
    /// The client is built on the blocking pool.
    pub async fn connect(config: &SandboxConfig) -> anyhow::Result<Self> {
        let config = config.clone();
        let inner = tokio::task::spawn_blocking(move || SandboxFilesystem::connect(&config))
            .await
            .context("client setup worker failed")??;
        Ok(Self::new(inner))
    }

    /// The synchronous facade this adapter dispatches to.
    pub fn blocking(&self) -> &SandboxFilesystem {
        &self.inner
    }

    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SandboxFilesystem) -> Result<T> + Send + 'static,
    {
        let fs = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&fs))
            .await
            .map_err(|e| FsError::failed_with(format!("filesystem worker failed: {}", e), e))?
    }

    pub async fn write_file(&self, path: &str, content: &str, encoding: Encoding) -> Result<()> {
        let (path, content) = (path.to_string(), content.to_string());
        self.run(move |fs| fs.write_file(&path, &content, encoding)).await
    }

    pub async fn write_bytes(&self, path: &str, bytes: &[u8], encoding: Encoding) -> Result<()> {
        let (path, bytes) = (path.to_string(), bytes.to_vec());
        self.run(move |fs| fs.write_bytes(&path, &bytes, encoding)).await
    }

    pub async fn read_file(&self, path: &str, encoding: Encoding) -> Result<FileContent> {
        let path = path.to_string();
        self.run(move |fs| fs.read_file(&path, encoding)).await
    }

    pub async fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        let path = path.to_string();
        self.run(move |fs| fs.mkdir(&path, recursive)).await
    }

    pub async fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let path = path.to_string();
        self.run(move |fs| fs.list_dir(&path)).await
    }

    pub async fn ls(&self, path: &str) -> Result<Vec<String>> {
        self.list_dir(path).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let path = path.to_string();
        self.run(move |fs| fs.delete_file(&path)).await
    }

    pub async fn delete_dir(&self, path: &str) -> Result<()> {
        let path = path.to_string();
        self.run(move |fs| fs.delete_dir(&path)).await
    }

    pub async fn rename_file(&self, old_path: &str, new_path: &str) -> Result<()> {
        let (old_path, new_path) = (old_path.to_string(), new_path.to_string());
        self.run(move |fs| fs.rename_file(&old_path, &new_path)).await
    }

    pub async fn move_file(&self, source_path: &str, destination_path: &str) -> Result<()> {
        let (src, dst) = (source_path.to_string(), destination_path.to_string());
        self.run(move |fs| fs.move_file(&src, &dst)).await
    }

    /// See [`SandboxFilesystem::exists`]. A worker failure also reads as `false`.
    pub async fn exists(&self, path: &str) -> bool {
        let path = path.to_string();
        self.run(move |fs| Ok(fs.exists(&path))).await.unwrap_or(false)
    }

    pub async fn is_file(&self, path: &str) -> bool {
        let path = path.to_string();
        self.run(move |fs| Ok(fs.is_file(&path))).await.unwrap_or(false)
    }

    pub async fn is_dir(&self, path: &str) -> bool {
        let path = path.to_string();
        self.run(move |fs| Ok(fs.is_dir(&path))).await.unwrap_or(false)
    }

    pub async fn try_exists(&self, path: &str) -> Result<bool> {
        let path = path.to_string();
        self.run(move |fs| fs.try_exists(&path)).await
    }

    pub async fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let path = path.to_string();
        self.run(move |fs| fs.remove(&path, recursive)).await
    }

    pub async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.remove(path, recursive).await
    }

    /// Writes one entry at a time; the first failure stops the batch.
    pub async fn write_files(&self, files: &[WriteEntry]) -> Result<()> {
        for entry in files {
            self.write_file(&entry.path, &entry.content, entry.encoding)
                .await?;
        }
        Ok(())
    }

    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
        encoding: Encoding,
    ) -> Result<()> {
        let local_path: PathBuf = local_path.as_ref().to_path_buf();
        let remote_path = remote_path.to_string();
        self.run(move |fs| fs.upload_file(&local_path, &remote_path, encoding))
            .await
    }

    pub async fn download_file(
        &self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        encoding: Encoding,
    ) -> Result<()> {
        let local_path: PathBuf = local_path.as_ref().to_path_buf();
        let remote_path = remote_path.to_string();
        self.run(move |fs| fs.download_file(&remote_path, &local_path, encoding))
            .await
    }

    /// Open an async handle. Mode and path are validated here, without I/O.
    pub fn open(&self, path: &str, mode: &str) -> Result<AsyncFileHandle> {
        if path.trim().is_empty() {
            return Err(FsError::usage("path must not be empty"));
        }
        let mode: OpenMode = mode.parse()?;
        Ok(AsyncFileHandle::new(self.clone(), path, mode))
    }

    /// Run `f` with an open handle, closing it afterwards whatever `f` returns.
    ///
    /// The handle is lent to `f` by value and handed back with its result,
    /// which keeps the future free of borrows:
    ///
    /// ```no_run
    /// # use sandbox_core::AsyncSandboxFilesystem;
    /// # async fn example(afs: AsyncSandboxFilesystem) -> sandbox_core::Result<()> {
    /// afs.with_open("/log.txt", "a", |mut h| async move {
    ///     let result = h.write("line\n").await;
    ///     (h, result)
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_open<T, F, Fut>(&self, path: &str, mode: &str, f: F) -> Result<T>
    where
        F: FnOnce(AsyncFileHandle) -> Fut,
        Fut: Future<Output = (AsyncFileHandle, Result<T>)>,
    {
        let handle = self.open(path, mode)?;
        let (mut handle, result) = f(handle).await;
        handle.close();
        result
    }
}

impl From<SandboxFilesystem> for AsyncSandboxFilesystem {
    fn from(inner: SandboxFilesystem) -> Self {
        Self::new(inner)
    }
}
