//! Error taxonomy for sandbox filesystem operations.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure a filesystem operation can surface.
#[derive(Debug, Error)]
pub enum FsError {
    /// The caller misused the API: bad handle state, empty path, unknown mode or encoding.
    /// Raised locally, before any remote call.
    #[error("{0}")]
    Usage(String),

    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: String },

    #[error("{what} already exists: {path}")]
    AlreadyExists { what: &'static str, path: String },

    #[error("directory not empty: {path}")]
    NotEmpty { path: String },

    /// Content could not be decoded under the declared encoding.
    #[error("cannot decode {path} as {encoding}: {source}. Use base64 encoding for binary files")]
    Decode {
        path: String,
        encoding: &'static str,
        #[source]
        source: BoxError,
    },

    /// Catch-all for remote errors without a known marker and for transport failures.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Discriminant of [`FsError`], handy for comparing outcomes without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Usage,
    NotFound,
    AlreadyExists,
    NotEmpty,
    Decode,
    Failed,
}

impl FsError {
    pub fn usage(message: impl Into<String>) -> Self {
        FsError::Usage(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        FsError::Failed {
            message: message.into(),
            source: None,
        }
    }

    pub fn failed_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        FsError::Failed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::Usage(_) => ErrorKind::Usage,
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::NotEmpty { .. } => ErrorKind::NotEmpty,
            FsError::Decode { .. } => ErrorKind::Decode,
            FsError::Failed { .. } => ErrorKind::Failed,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
