//! Maps opaque remote error text onto typed errors.
//!
//! The sandbox reports failures as free-form strings. Classification is a
//! case-insensitive substring search over a single ordered table; the
//! first marker (in table order) that both applies to the operation and
//! matches the text wins. Adding a marker or a new needle is a one-line
//! change to [`MARKERS`].

use crate::error::FsError;

/// A known remote fault condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    NoSuchFile,
    DirNotEmpty,
    FileExists,
}

/// Priority-ordered marker table.
pub const MARKERS: &[(Marker, &[&str])] = &[
    (Marker::NoSuchFile, &["no such file", "not found", "does not exist"]),
    (Marker::DirNotEmpty, &["directory not empty", "not empty"]),
    (Marker::FileExists, &["file exists", "already exists"]),
];

impl Marker {
    pub fn needles(self) -> &'static [&'static str] {
        MARKERS
            .iter()
            .find(|(marker, _)| *marker == self)
            .map(|(_, needles)| *needles)
            .unwrap_or(&[])
    }

    /// Whether `message` carries this marker.
    pub fn matches(self, message: &str) -> bool {
        let haystack = message.to_lowercase();
        self.needles().iter().any(|needle| haystack.contains(needle))
    }

    /// Typed error for this marker. `what` names the object ("file", "directory").
    pub fn to_error(self, what: &'static str, path: &str) -> FsError {
        let path = path.to_string();
        match self {
            Marker::NoSuchFile => FsError::NotFound { what, path },
            Marker::DirNotEmpty => FsError::NotEmpty { path },
            Marker::FileExists => FsError::AlreadyExists { what, path },
        }
    }
}

/// First marker from `allowed` that matches `message`, in table order.
pub fn classify(message: &str, allowed: &[Marker]) -> Option<Marker> {
    MARKERS
        .iter()
        .map(|(marker, _)| *marker)
        .filter(|marker| allowed.contains(marker))
        .find(|marker| marker.matches(message))
}
