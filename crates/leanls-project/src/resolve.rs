//! Finding the project that governs a document.
//!
//! Starting from the document's directory, each level is tested in a fixed
//! order before moving up:
//!
//! 1. a `lean-toolchain` marker (subject to the artifact escape below),
//! 2. the shape of a core distribution root,
//! 3. the workspace folder containing the start, which is never crossed,
//! 4. the filesystem root, where the search gives up and falls back to the
//!    starting directory.
//!
//! Files under a dependency's build output (`.lake`, `build`) belong to the
//! project that pulled the dependency in, not to the dependency itself, so a
//! marker found beneath such a directory is overridden by the marker next to
//! the first artifact directory above it.

use std::fmt;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use leanls_source::has_dir_name;
use leanls_source::parent_dir;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;
use serde::Serialize;
use serde::Serializer;

use crate::distribution::core_shape_at;
use crate::folders::WorkspaceFolders;
use crate::root::ProjectRoot;
use crate::toolchain::find_marker;
use crate::toolchain::ToolchainMarker;

/// Directory names holding generated build output.
pub const ARTIFACT_DIRS: [&str; 2] = [".lake", "build"];

/// The rule that ended a resolution walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolvedBy {
    /// The document has no filesystem location.
    Virtual,
    /// A `lean-toolchain` was found.
    Marker,
    /// A marker was found, but it sits below a dependency's build output
    /// and the consuming project above won.
    ArtifactEscape,
    /// The directory is the Lean implementation's own source tree.
    CoreDistribution,
    /// The walk reached the workspace folder boundary.
    WorkspaceFence,
    /// The walk reached the filesystem root without finding anything.
    Fallback,
}

impl fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolvedBy::Virtual => "virtual",
            ResolvedBy::Marker => "marker",
            ResolvedBy::ArtifactEscape => "artifact-escape",
            ResolvedBy::CoreDistribution => "core-distribution",
            ResolvedBy::WorkspaceFence => "workspace-fence",
            ResolvedBy::Fallback => "fallback",
        })
    }
}

impl Serialize for ResolvedBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub root: ProjectRoot,
    pub marker: Option<ToolchainMarker>,
    pub resolved_by: ResolvedBy,
}

impl Resolution {
    fn at(
        fs: &dyn FileSystem,
        dir: &Utf8Path,
        marker: Option<ToolchainMarker>,
        resolved_by: ResolvedBy,
    ) -> Self {
        Self {
            root: ProjectRoot::from_path(fs, dir),
            marker,
            resolved_by,
        }
    }
}

enum Walk {
    Walking(Utf8PathBuf),
    Escaping {
        level: Utf8PathBuf,
        marker: ToolchainMarker,
    },
    Done(Resolution),
}

/// Resolve the project root governing `location`.
///
/// Always produces a root: virtual documents are their own root, and a
/// document with nothing above it resolves to its own directory.
#[must_use]
pub fn find_project_root(
    fs: &dyn FileSystem,
    folders: &WorkspaceFolders,
    location: &DocumentLocation,
) -> Resolution {
    let path = match location {
        DocumentLocation::Virtual(_) => {
            tracing::debug!("{location} is not on disk, using it as its own root");
            return Resolution {
                root: ProjectRoot::new(fs, location.clone()),
                marker: None,
                resolved_by: ResolvedBy::Virtual,
            };
        }
        DocumentLocation::File(path) => path,
    };

    let start = start_dir(fs, path);
    let fence = folders.containing(&start);

    let mut state = Walk::Walking(start.clone());
    loop {
        state = match state {
            Walk::Walking(dir) => step(fs, &start, fence, dir),
            Walk::Escaping { level, marker } => match find_artifact_escape(fs, folders, &level) {
                Some(escape) => Walk::Done(escape),
                None => Walk::Done(Resolution::at(
                    fs,
                    &level,
                    Some(marker),
                    ResolvedBy::Marker,
                )),
            },
            Walk::Done(resolution) => {
                tracing::debug!(
                    "Resolved {location} to {} ({:?})",
                    resolution.root,
                    resolution.resolved_by
                );
                return resolution;
            }
        };
    }
}

/// Directories are walked from themselves, anything else from its parent.
fn start_dir(fs: &dyn FileSystem, path: &Utf8Path) -> Utf8PathBuf {
    if fs.is_dir(path) {
        path.to_path_buf()
    } else {
        parent_dir(path).unwrap_or(path).to_path_buf()
    }
}

fn step(fs: &dyn FileSystem, start: &Utf8Path, fence: Option<&Utf8Path>, dir: Utf8PathBuf) -> Walk {
    if let Some(marker) = find_marker(fs, &dir) {
        return Walk::Escaping { level: dir, marker };
    }

    if let Some(shape) = core_shape_at(fs, &dir) {
        tracing::trace!("{dir} looks like a core distribution ({shape:?})");
        return Walk::Done(Resolution::at(fs, &dir, None, ResolvedBy::CoreDistribution));
    }

    if fence == Some(dir.as_path()) {
        return Walk::Done(Resolution::at(fs, &dir, None, ResolvedBy::WorkspaceFence));
    }

    match parent_dir(&dir) {
        Some(parent) => Walk::Walking(parent.to_path_buf()),
        None => Walk::Done(Resolution::at(fs, start, None, ResolvedBy::Fallback)),
    }
}

/// Look above `level` for the project consuming it as a dependency.
///
/// Walks up from `level`'s parent to the first `.lake` or `build` directory.
/// If the directory holding that artifact directory has a marker, it is the
/// governing project. Only the first artifact directory is considered. The
/// walk never reaches the workspace folder containing `level`, so the owner
/// always lies inside it.
#[must_use]
pub fn find_artifact_escape(
    fs: &dyn FileSystem,
    folders: &WorkspaceFolders,
    level: &Utf8Path,
) -> Option<Resolution> {
    let fence = folders.containing(level);
    if fence == Some(level) {
        return None;
    }
    let mut current = parent_dir(level)?;

    loop {
        // An owner above the fence would put the root outside the folder.
        if fence == Some(current) {
            return None;
        }

        if is_artifact_dir(current) {
            let owner = parent_dir(current)?;
            let marker = find_marker(fs, owner)?;
            tracing::debug!("{level} is inside build output of {owner}");
            return Some(Resolution::at(
                fs,
                owner,
                Some(marker),
                ResolvedBy::ArtifactEscape,
            ));
        }

        current = parent_dir(current)?;
    }
}

fn is_artifact_dir(dir: &Utf8Path) -> bool {
    ARTIFACT_DIRS.iter().any(|name| has_dir_name(dir, name))
}
