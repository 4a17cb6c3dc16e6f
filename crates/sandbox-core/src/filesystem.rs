//! Filesystem operations against a sandbox.
//!
//! Native primitives (read, write, mkdir, list, delete) go through
//! [`SandboxApi`]. Rename, move, existence probes and `rm` have no API
//! counterpart and run as quoted shell commands through
//! [`CommandExecutor`]. Every call is a fresh round trip; nothing is cached.

use std::path::Path;
use std::sync::Arc;

use sandbox_host::HostFileSystem;
use sandbox_platform::{CommandExecutor, CommandResult, LocalFs, OperationResponse, SandboxApi};
use tracing::{debug, warn};

use crate::classify::{classify, Marker};
use crate::client::SandboxClient;
use crate::config::SandboxConfig;
use crate::content::{Encoding, FileContent, WriteEntry};
use crate::error::{BoxError, FsError, Result};
use crate::handle::{FileHandle, OpenMode};
use crate::shell::{self, TestFlag};

/// Synchronous filesystem facade. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct SandboxFilesystem {
    api: Arc<dyn SandboxApi>,
    executor: Arc<dyn CommandExecutor>,
    local: Arc<dyn LocalFs>,
}

fn require_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(FsError::usage("path must not be empty"));
    }
    Ok(())
}

/// Build the error for a failed call: a typed error if `message` carries one
/// of `markers`, otherwise a generic failure keeping `source` as the cause.
fn failure(
    op: &str,
    what: &'static str,
    path: &str,
    message: &str,
    markers: &[Marker],
    source: Option<BoxError>,
) -> FsError {
    if let Some(marker) = classify(message, markers) {
        return marker.to_error(what, path);
    }
    FsError::Failed {
        message: format!("failed to {}: {}", op, message.trim()),
        source,
    }
}

impl SandboxFilesystem {
    /// Facade over the given collaborators, using the host filesystem for
    /// uploads and downloads.
    pub fn new(api: Arc<dyn SandboxApi>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            api,
            executor,
            local: Arc::new(HostFileSystem::new()),
        }
    }

    pub fn with_local_fs(mut self, local: Arc<dyn LocalFs>) -> Self {
        self.local = local;
        self
    }

    /// Facade talking to the sandbox described by `config` over HTTP.
    pub fn connect(config: &SandboxConfig) -> anyhow::Result<Self> {
        let client = Arc::new(SandboxClient::new(config.clone())?);
        Ok(Self::new(client.clone(), client))
    }

    fn remote<F>(
        &self,
        op: &str,
        what: &'static str,
        path: &str,
        markers: &[Marker],
        call: F,
    ) -> Result<OperationResponse>
    where
        F: FnOnce(&dyn SandboxApi) -> anyhow::Result<OperationResponse>,
    {
        match call(self.api.as_ref()) {
            Ok(resp) => match resp.error() {
                Some(message) => Err(failure(op, what, path, message, markers, None)),
                None => Ok(resp),
            },
            // Transport text says nothing about the path (a 404 from a wrong
            // base URL reads "Not Found"), so it is never classified.
            Err(e) => {
                let message = format!("{:#}", e);
                Err(failure(op, what, path, &message, &[], Some(e.into())))
            }
        }
    }

    fn shell(&self, op: &str, what: &'static str, path: &str, command: &str) -> Result<()> {
        debug!("{}: {}", op, command);
        let result = self.executor.execute(command).map_err(|e| {
            let message = format!("{:#}", e);
            failure(op, what, path, &message, &[], Some(e.into()))
        })?;
        if result.success {
            return Ok(());
        }
        Err(failure(op, what, path, &result.stderr, &[Marker::NoSuchFile], None))
    }

    fn probe(&self, flag: TestFlag, path: &str) -> bool {
        if path.trim().is_empty() {
            return false;
        }
        match self.executor.execute(&shell::test(flag, path)) {
            Ok(CommandResult { success, .. }) => success,
            Err(e) => {
                // Indistinguishable from "absent" for the caller; try_exists surfaces it.
                warn!("existence probe for {} failed: {:#}", path, e);
                false
            }
        }
    }

    /// Write `content` to `path`, replacing any existing file.
    ///
    /// `content` is sent as-is; `encoding` records how the caller encoded
    /// it (use [`Encoding::Base64`] for binary data already in base64).
    pub fn write_file(&self, path: &str, content: &str, encoding: Encoding) -> Result<()> {
        require_path(path)?;
        debug!("write_file: {} ({} bytes, {})", path, content.len(), encoding);
        self.remote("write file", "file", path, &[], |api| api.write_file(path, content))?;
        Ok(())
    }

    /// Write raw bytes, encoding them as base64 or validating them as utf-8 first.
    pub fn write_bytes(&self, path: &str, bytes: &[u8], encoding: Encoding) -> Result<()> {
        require_path(path)?;
        let content = encoding.encode(path, bytes.to_vec())?;
        self.write_file(path, &content, encoding)
    }

    pub fn read_file(&self, path: &str, encoding: Encoding) -> Result<FileContent> {
        require_path(path)?;
        debug!("read_file: {}", path);
        let resp = self.remote("read file", "file", path, &[Marker::NoSuchFile], |api| {
            api.read_file(path)
        })?;
        Ok(FileContent::new(resp.content.unwrap_or_default(), encoding))
    }

    /// Create a directory.
    ///
    /// The sandbox always creates missing parents, so `recursive` has no
    /// effect; it is accepted for symmetry with local filesystem APIs.
    pub fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        require_path(path)?;
        debug!("mkdir: {} (recursive={})", path, recursive);
        self.remote("create directory", "directory", path, &[Marker::FileExists], |api| {
            api.make_dir(path)
        })?;
        Ok(())
    }

    /// Names of the entries in `path`, in the order the sandbox returns them.
    pub fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        require_path(path)?;
        debug!("list_dir: {}", path);
        let resp = self.remote("list directory", "directory", path, &[Marker::NoSuchFile], |api| {
            api.list_dir(path)
        })?;
        Ok(resp.entries.unwrap_or_default())
    }

    pub fn ls(&self, path: &str) -> Result<Vec<String>> {
        self.list_dir(path)
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        require_path(path)?;
        debug!("delete_file: {}", path);
        self.remote("delete file", "file", path, &[Marker::NoSuchFile], |api| {
            api.delete_file(path)
        })?;
        Ok(())
    }

    pub fn delete_dir(&self, path: &str) -> Result<()> {
        require_path(path)?;
        debug!("delete_dir: {}", path);
        self.remote(
            "delete directory",
            "directory",
            path,
            &[Marker::NoSuchFile, Marker::DirNotEmpty],
            |api| api.delete_dir(path),
        )?;
        Ok(())
    }

    pub fn rename_file(&self, old_path: &str, new_path: &str) -> Result<()> {
        require_path(old_path)?;
        require_path(new_path)?;
        self.shell("rename file", "file", old_path, &shell::mv(old_path, new_path))
    }

    pub fn move_file(&self, source_path: &str, destination_path: &str) -> Result<()> {
        require_path(source_path)?;
        require_path(destination_path)?;
        self.shell(
            "move file",
            "file",
            source_path,
            &shell::mv(source_path, destination_path),
        )
    }

    /// Whether anything exists at `path`. Never fails: an unreachable
    /// sandbox reads as `false`. Use [`try_exists`](Self::try_exists) to
    /// tell the two apart.
    pub fn exists(&self, path: &str) -> bool {
        self.probe(TestFlag::Exists, path)
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.probe(TestFlag::File, path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.probe(TestFlag::Dir, path)
    }

    /// Like [`exists`](Self::exists), but a failure to reach the sandbox is an error.
    pub fn try_exists(&self, path: &str) -> Result<bool> {
        require_path(path)?;
        let result = self
            .executor
            .execute(&shell::test(TestFlag::Exists, path))
            .map_err(|e| {
                FsError::failed_with(format!("failed to check {}: {:#}", path, e), e)
            })?;
        Ok(result.success)
    }

    /// Remove a file, or with `recursive` a whole tree.
    pub fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        require_path(path)?;
        self.shell("remove", "file", path, &shell::rm(path, recursive))
    }

    pub fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        self.remove(path, recursive)
    }

    /// Write each entry in order. The first failure stops the batch.
    pub fn write_files(&self, files: &[WriteEntry]) -> Result<()> {
        for entry in files {
            self.write_file(&entry.path, &entry.content, entry.encoding)?;
        }
        Ok(())
    }

    /// Copy a host file into the sandbox.
    pub fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
        encoding: Encoding,
    ) -> Result<()> {
        let local_path = local_path.as_ref();
        require_path(remote_path)?;
        let local_name = local_path.display().to_string();
        if !self.local.exists(local_path) {
            return Err(FsError::NotFound {
                what: "local file",
                path: local_name,
            });
        }

        let bytes = self.local.read(local_path).map_err(|e| {
            FsError::failed_with(format!("failed to read local file {}: {:#}", local_name, e), e)
        })?;
        debug!("upload: {} -> {} ({} bytes)", local_name, remote_path, bytes.len());

        let content = encoding.encode(&local_name, bytes)?;
        self.write_file(remote_path, &content, encoding)
    }

    /// Copy a sandbox file to the host.
    pub fn download_file(
        &self,
        remote_path: &str,
        local_path: impl AsRef<Path>,
        encoding: Encoding,
    ) -> Result<()> {
        let local_path = local_path.as_ref();
        let bytes = self.read_file(remote_path, encoding)?.into_bytes(remote_path)?;
        debug!(
            "download: {} -> {} ({} bytes)",
            remote_path,
            local_path.display(),
            bytes.len()
        );
        self.local.write(local_path, &bytes).map_err(|e| {
            FsError::failed_with(
                format!("failed to write local file {}: {:#}", local_path.display(), e),
                e,
            )
        })
    }

    /// Open a handle on `path`. `mode` is `r`, `w` or `a`, optionally with `+`.
    pub fn open(&self, path: &str, mode: &str) -> Result<FileHandle<'_>> {
        require_path(path)?;
        let mode: OpenMode = mode.parse()?;
        Ok(FileHandle::new(self, path, mode))
    }

    /// Run `f` with an open handle, closing it afterwards whatever `f` returns.
    pub fn with_open<T, F>(&self, path: &str, mode: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut FileHandle<'_>) -> Result<T>,
    {
        let mut handle = self.open(path, mode)?;
        let result = f(&mut handle);
        handle.close();
        result
    }

    /// Overwrite `path` with `content`, or with `append` add it after the
    /// current content. A missing file counts as empty when appending.
    pub(crate) fn write_through(&self, path: &str, content: &str, append: bool) -> Result<()> {
        if !append {
            return self.write_file(path, content, Encoding::Utf8);
        }
        let combined = match self.read_file(path, Encoding::Utf8) {
            Ok(existing) => existing.content + content,
            Err(e) if e.is_not_found() => content.to_string(),
            Err(e) => return Err(e),
        };
        self.write_file(path, &combined, Encoding::Utf8)
    }
}
