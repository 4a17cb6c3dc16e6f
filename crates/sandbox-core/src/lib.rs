//! Client-side filesystem for remote sandboxes.
//!
//! [`SandboxFilesystem`] maps whole-file operations onto the sandbox
//! control-plane API and falls back to quoted shell commands for the
//! operations the API lacks. [`AsyncSandboxFilesystem`] runs the same
//! operations on tokio's blocking pool.
//!
//! ```no_run
//! use sandbox_core::{Encoding, SandboxConfig, SandboxFilesystem};
//!
//! # fn example() -> anyhow::Result<()> {
//! let fs = SandboxFilesystem::connect(&SandboxConfig::new("https://sandbox.example.com"))?;
//! fs.mkdir("/workspace", true)?;
//! fs.write_file("/workspace/hello.txt", "hello", Encoding::Utf8)?;
//! for name in fs.list_dir("/workspace")? {
//!     println!("{}", name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod async_fs;
pub mod classify;
pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod filesystem;
pub mod handle;
pub mod shell;

#[cfg(test)]
mod testing;

pub use async_fs::AsyncSandboxFilesystem;
pub use client::SandboxClient;
pub use config::SandboxConfig;
pub use content::{Encoding, FileContent, WriteEntry};
pub use error::{ErrorKind, FsError, Result};
pub use filesystem::SandboxFilesystem;
pub use handle::{AsyncFileHandle, FileHandle, OpenMode};
