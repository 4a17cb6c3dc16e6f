use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw response from a sandbox API call.
///
/// Either a payload (`content` or `entries`) or an `error` is populated,
/// never both in a meaningful way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_entries(entries: Vec<String>) -> Self {
        Self {
            entries: Some(entries),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The remote error text, if the call failed. An empty string counts as no error.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Request/response filesystem primitives exposed by the sandbox control plane.
///
/// An `Err` means the call itself failed (transport, decoding, ...). A
/// remote-side failure comes back as `Ok` with [`OperationResponse::error`] set.
pub trait SandboxApi: Send + Sync {
    fn write_file(&self, path: &str, content: &str) -> Result<OperationResponse>;
    fn read_file(&self, path: &str) -> Result<OperationResponse>;

    /// Creates the directory and any missing parents.
    fn make_dir(&self, path: &str) -> Result<OperationResponse>;
    fn list_dir(&self, path: &str) -> Result<OperationResponse>;
    fn delete_file(&self, path: &str) -> Result<OperationResponse>;
    fn delete_dir(&self, path: &str) -> Result<OperationResponse>;
}
