use leanls_source::DocumentLocation;
use leanls_source::FileSystem;
use serde::Serialize;

use crate::folders::WorkspaceFolders;
use crate::resolve::find_project_root;
use crate::resolve::ResolvedBy;
use crate::root::ProjectRoot;
use crate::toolchain::read_marker_or_warn;
use crate::toolchain::VersionString;

/// A document's governing project and the toolchain it asks for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub root: ProjectRoot,
    pub version: Option<VersionString>,
    pub resolved_by: ResolvedBy,
}

/// Resolve the project root for `location` and read its toolchain version.
///
/// Never fails: an unreadable `lean-toolchain` is logged and the document
/// keeps its root with no version.
#[must_use]
pub fn resolve_version(
    fs: &dyn FileSystem,
    folders: &WorkspaceFolders,
    location: &DocumentLocation,
) -> VersionInfo {
    let resolution = find_project_root(fs, folders, location);

    let version = resolution
        .marker
        .as_ref()
        .and_then(|marker| read_marker_or_warn(fs, marker));

    VersionInfo {
        root: resolution.root,
        version,
        resolved_by: resolution.resolved_by,
    }
}
