use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{FsError, Result};

/// How file content is represented on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Base64 => "base64",
        }
    }

    /// Turn raw bytes into wire text.
    ///
    /// Base64 accepts anything; utf-8 fails with [`FsError::Decode`] on
    /// invalid sequences instead of replacing them.
    pub fn encode(self, path: &str, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Base64 => Ok(general_purpose::STANDARD.encode(bytes)),
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| FsError::Decode {
                path: path.to_string(),
                encoding: self.as_str(),
                source: e.into(),
            }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "base64" => Ok(Encoding::Base64),
            other => Err(FsError::usage(format!(
                "unsupported encoding '{}' (expected utf-8 or base64)",
                other
            ))),
        }
    }
}

/// File content as returned by a read, tagged with the encoding it was read under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub content: String,
    pub encoding: Encoding,
}

impl FileContent {
    pub fn new(content: impl Into<String>, encoding: Encoding) -> Self {
        Self {
            content: content.into(),
            encoding,
        }
    }

    /// Decode into raw bytes. `path` is only used for error reporting.
    /// Whitespace inside base64 text (line wrapping) is ignored.
    pub fn into_bytes(self, path: &str) -> Result<Vec<u8>> {
        match self.encoding {
            Encoding::Utf8 => Ok(self.content.into_bytes()),
            Encoding::Base64 => general_purpose::STANDARD
                .decode(
                    self.content
                        .bytes()
                        .filter(|b| !b.is_ascii_whitespace())
                        .collect::<Vec<u8>>(),
                )
                .map_err(|e| FsError::Decode {
                    path: path.to_string(),
                    encoding: Encoding::Base64.as_str(),
                    source: e.into(),
                }),
        }
    }
}

/// One entry of a batch write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteEntry {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub encoding: Encoding,
}

impl WriteEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            encoding: Encoding::Utf8,
        }
    }
}
