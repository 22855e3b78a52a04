use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use camino::Utf8Path;
use leanls_source::clean_utf8_path;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;
use serde::Serialize;
use serde::Serializer;

/// The directory governing toolchain and build configuration for the
/// documents beneath it.
///
/// Two roots are the same project iff their canonical keys match, so
/// `/ws/proj`, `/ws/proj/` and a symlink to it all route to one server.
/// The location is kept as resolved for display.
#[derive(Clone, Debug)]
pub struct ProjectRoot {
    location: DocumentLocation,
    key: String,
}

impl ProjectRoot {
    #[must_use]
    pub fn new(fs: &dyn FileSystem, location: DocumentLocation) -> Self {
        let key = match &location {
            DocumentLocation::File(path) => canonical_key(fs, path),
            DocumentLocation::Virtual(uri) => uri.clone(),
        };
        Self { location, key }
    }

    #[must_use]
    pub fn from_path(fs: &dyn FileSystem, path: &Utf8Path) -> Self {
        Self::new(fs, DocumentLocation::file(path))
    }

    #[must_use]
    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.location.as_path()
    }

    /// The identity used for equality and routing.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.location.is_virtual()
    }

    /// Whether this root lies at or below `folder`.
    #[must_use]
    pub fn is_within(&self, folder: &Utf8Path) -> bool {
        self.path().is_some_and(|path| path.starts_with(folder))
    }
}

fn canonical_key(fs: &dyn FileSystem, path: &Utf8Path) -> String {
    let canonical = fs
        .canonicalize(path)
        .map_or_else(|_| clean_utf8_path(path), |p| clean_utf8_path(&p));

    if cfg!(any(windows, target_os = "macos")) {
        canonical.as_str().to_lowercase()
    } else {
        canonical.into_string()
    }
}

impl PartialEq for ProjectRoot {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ProjectRoot {}

impl Hash for ProjectRoot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.location, f)
    }
}

impl Serialize for ProjectRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.location.serialize(serializer)
    }
}
