use std::io;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;
use serde::Serialize;
use thiserror::Error;

/// Name of the per-project file naming the toolchain to use.
pub const TOOLCHAIN_FILE: &str = "lean-toolchain";

/// Trimmed contents of a `lean-toolchain` file, e.g.
/// `leanprover/lean4:v4.9.0`. Not validated further.
pub type VersionString = String;

/// Location of a `lean-toolchain` file sitting directly inside a project root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ToolchainMarker {
    path: Utf8PathBuf,
}

impl ToolchainMarker {
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The directory holding the marker.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to read toolchain file {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The marker directly inside `dir`, if one exists.
#[must_use]
pub fn find_marker(fs: &dyn FileSystem, dir: &Utf8Path) -> Option<ToolchainMarker> {
    let path = dir.join(TOOLCHAIN_FILE);
    fs.exists(&path).then_some(ToolchainMarker { path })
}

pub fn read_marker_file(
    fs: &dyn FileSystem,
    marker: &ToolchainMarker,
) -> Result<VersionString, MarkerError> {
    fs.read_to_string(marker.path())
        .map(|content| content.trim().to_string())
        .map_err(|source| MarkerError::Read {
            path: marker.path().to_path_buf(),
            source,
        })
}

/// The version named by the marker in `root`.
///
/// A missing marker is the common case and yields `None` silently. A marker
/// that exists but cannot be read is logged and also yields `None`, so the
/// caller can fall back to a default toolchain.
#[must_use]
pub fn read_marker(fs: &dyn FileSystem, root: &DocumentLocation) -> Option<VersionString> {
    let marker = find_marker(fs, root.as_path()?)?;
    read_marker_or_warn(fs, &marker)
}

/// Read `marker`, logging a failure and degrading it to `None`.
pub(crate) fn read_marker_or_warn(
    fs: &dyn FileSystem,
    marker: &ToolchainMarker,
) -> Option<VersionString> {
    read_marker_file(fs, marker)
        .inspect_err(|err| tracing::warn!("{err}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use leanls_source::InMemoryFileSystem;

    use super::*;
    use crate::testing::NoAccessFileSystem;

    #[test]
    fn test_reads_and_trims() {
        let mut fs = InMemoryFileSystem::new();
        fs.add_file(
            "/ws/proj/lean-toolchain".into(),
            "  leanprover/lean4:v4.0.0\n\n".to_string(),
        );

        assert_eq!(
            read_marker(&fs, &DocumentLocation::file("/ws/proj")),
            Some("leanprover/lean4:v4.0.0".to_string())
        );
    }

    #[test]
    fn test_content_is_otherwise_verbatim() {
        let mut fs = InMemoryFileSystem::new();
        fs.add_file(
            "/ws/proj/lean-toolchain".into(),
            "not a version at all\n".to_string(),
        );

        assert_eq!(
            read_marker(&fs, &DocumentLocation::file("/ws/proj")),
            Some("not a version at all".to_string())
        );
    }

    #[test]
    fn test_missing_marker_is_absent() {
        let mut fs = InMemoryFileSystem::new();
        fs.add_dir("/ws/proj".into());

        assert!(find_marker(&fs, Utf8Path::new("/ws/proj")).is_none());
        assert_eq!(read_marker(&fs, &DocumentLocation::file("/ws/proj")), None);
    }

    #[test]
    fn test_unreadable_marker_is_absent() {
        // A directory named like the marker exists but cannot be read as text.
        let mut fs = InMemoryFileSystem::new();
        fs.add_dir("/ws/proj/lean-toolchain".into());

        let marker = find_marker(&fs, Utf8Path::new("/ws/proj")).unwrap();
        assert!(matches!(
            read_marker_file(&fs, &marker),
            Err(MarkerError::Read { .. })
        ));
        assert_eq!(read_marker(&fs, &DocumentLocation::file("/ws/proj")), None);
    }

    #[test]
    fn test_marker_dir() {
        let mut fs = InMemoryFileSystem::new();
        fs.add_file("/ws/proj/lean-toolchain".into(), String::new());

        let marker = find_marker(&fs, Utf8Path::new("/ws/proj")).unwrap();
        assert_eq!(marker.dir(), Utf8Path::new("/ws/proj"));
        assert_eq!(marker.path(), Utf8Path::new("/ws/proj/lean-toolchain"));
    }

    #[test]
    fn test_virtual_root_has_no_version() {
        assert_eq!(
            read_marker(
                &NoAccessFileSystem,
                &DocumentLocation::virtual_uri("untitled:Untitled-1")
            ),
            None
        );
    }
}
