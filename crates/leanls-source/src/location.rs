use std::fmt;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Serialize;

use crate::path::absolute_utf8_path;

/// Where a document or directory lives.
///
/// Only [`DocumentLocation::File`] locations are backed by the filesystem.
/// Anything the editor hands us with another scheme (`untitled:`,
/// `vscode-notebook-cell:`, ...) is kept verbatim as a virtual location and
/// never probed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum DocumentLocation {
    File(Utf8PathBuf),
    Virtual(String),
}

impl DocumentLocation {
    /// A filesystem location, made absolute and lexically cleaned.
    #[must_use]
    pub fn file(path: impl AsRef<Utf8Path>) -> Self {
        Self::File(absolute_utf8_path(path.as_ref()))
    }

    /// A location without filesystem backing, identified by its URI.
    #[must_use]
    pub fn virtual_uri(uri: impl Into<String>) -> Self {
        Self::Virtual(uri.into())
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Virtual(_) => None,
        }
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }
}

impl From<&Utf8Path> for DocumentLocation {
    fn from(path: &Utf8Path) -> Self {
        Self::file(path)
    }
}

impl From<Utf8PathBuf> for DocumentLocation {
    fn from(path: Utf8PathBuf) -> Self {
        Self::file(path)
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{path}"),
            Self::Virtual(uri) => write!(f, "{uri}"),
        }
    }
}
