//! File handles bound to a sandbox path and an open mode.
//!
//! Handles hold no connection. `read` and `write` map onto whole-file
//! facade calls; `close` only flips a flag. Both handle types close
//! themselves on drop.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::async_fs::AsyncSandboxFilesystem;
use crate::content::Encoding;
use crate::error::{FsError, Result};
use crate::filesystem::SandboxFilesystem;

/// Parsed open mode.
///
/// One of `r`, `w`, `a`, optionally followed by `+` (adds the missing
/// read or write capability). `b` and `t` are accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    read: bool,
    write: bool,
    append: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode { read: true, write: false, append: false };
    pub const WRITE: OpenMode = OpenMode { read: false, write: true, append: false };
    pub const APPEND: OpenMode = OpenMode { read: false, write: true, append: true };

    pub fn can_read(self) -> bool {
        self.read
    }

    pub fn can_write(self) -> bool {
        self.write
    }

    pub fn is_append(self) -> bool {
        self.append
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        let mut base: Option<OpenMode> = None;
        let mut plus = false;
        for ch in s.chars() {
            let next = match ch {
                'r' => OpenMode::READ,
                'w' => OpenMode::WRITE,
                'a' => OpenMode::APPEND,
                '+' if !plus => {
                    plus = true;
                    continue;
                }
                'b' | 't' => continue,
                _ => return Err(FsError::usage(format!("invalid mode: '{}'", s))),
            };
            if base.replace(next).is_some() {
                return Err(FsError::usage(format!("invalid mode: '{}'", s)));
            }
        }
        let mut mode =
            base.ok_or_else(|| FsError::usage(format!("invalid mode: '{}'", s)))?;
        if plus {
            mode.read = true;
            mode.write = true;
        }
        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match (self.append, self.write, self.read) {
            (true, _, _) => "a",
            (false, true, false) => "w",
            (false, true, true) => "r+",
            _ => "r",
        };
        f.write_str(base)?;
        if self.append && self.read {
            f.write_str("+")?;
        }
        Ok(())
    }
}

/// Path, mode and closed flag shared by both handle flavors.
#[derive(Debug, Clone)]
struct HandleState {
    path: String,
    mode: OpenMode,
    closed: bool,
}

impl HandleState {
    fn new(path: &str, mode: OpenMode) -> Self {
        Self {
            path: path.to_string(),
            mode,
            closed: false,
        }
    }

    fn check_read(&self) -> Result<()> {
        if self.closed {
            return Err(FsError::usage("file is closed"));
        }
        if !self.mode.can_read() {
            return Err(FsError::usage("file not opened for reading"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.closed {
            return Err(FsError::usage("file is closed"));
        }
        if !self.mode.can_write() {
            return Err(FsError::usage("file not opened for writing"));
        }
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            trace!("closing handle on {}", self.path);
            self.closed = true;
        }
    }
}

/// Synchronous file handle, created by [`SandboxFilesystem::open`].
pub struct FileHandle<'a> {
    fs: &'a SandboxFilesystem,
    state: HandleState,
}

impl<'a> FileHandle<'a> {
    pub(crate) fn new(fs: &'a SandboxFilesystem, path: &str, mode: OpenMode) -> Self {
        Self {
            fs,
            state: HandleState::new(path, mode),
        }
    }

    pub fn path(&self) -> &str {
        &self.state.path
    }

    pub fn mode(&self) -> OpenMode {
        self.state.mode
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Whole file content as text.
    pub fn read(&self) -> Result<String> {
        self.state.check_read()?;
        Ok(self.fs.read_file(&self.state.path, Encoding::Utf8)?.content)
    }

    /// Replace the file with `content`, or in append mode add it to the end.
    pub fn write(&mut self, content: &str) -> Result<()> {
        self.state.check_write()?;
        self.fs
            .write_through(&self.state.path, content, self.state.mode.is_append())
    }

    pub fn close(&mut self) {
        self.state.close();
    }
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Asynchronous file handle, created by [`AsyncSandboxFilesystem::open`].
pub struct AsyncFileHandle {
    fs: AsyncSandboxFilesystem,
    state: HandleState,
}

impl AsyncFileHandle {
    pub(crate) fn new(fs: AsyncSandboxFilesystem, path: &str, mode: OpenMode) -> Self {
        Self {
            fs,
            state: HandleState::new(path, mode),
        }
    }

    pub fn path(&self) -> &str {
        &self.state.path
    }

    pub fn mode(&self) -> OpenMode {
        self.state.mode
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    pub async fn read(&self) -> Result<String> {
        self.state.check_read()?;
        Ok(self
            .fs
            .read_file(&self.state.path, Encoding::Utf8)
            .await?
            .content)
    }

    pub async fn write(&mut self, content: &str) -> Result<()> {
        self.state.check_write()?;
        let path = self.state.path.clone();
        let content = content.to_string();
        let append = self.state.mode.is_append();
        self.fs
            .run(move |fs| fs.write_through(&path, &content, append))
            .await
    }

    pub fn close(&mut self) {
        self.state.close();
    }
}

impl Drop for AsyncFileHandle {
    fn drop(&mut self) {
        self.close();
    }
}
