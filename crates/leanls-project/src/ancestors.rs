use camino::Utf8Path;
use leanls_source::parent_dir;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;

use crate::distribution::core_shape_at;
use crate::root::ProjectRoot;
use crate::toolchain::find_marker;

/// A folder is a project if it has a `lean-toolchain` or is a core
/// distribution root.
#[must_use]
pub fn is_valid_project(fs: &dyn FileSystem, location: &DocumentLocation) -> bool {
    location
        .as_path()
        .is_some_and(|dir| is_valid_project_dir(fs, dir))
}

fn is_valid_project_dir(fs: &dyn FileSystem, dir: &Utf8Path) -> bool {
    find_marker(fs, dir).is_some() || core_shape_at(fs, dir).is_some()
}

/// The closest strict ancestor of `start` that is itself a valid project.
///
/// `start` is not tested, and workspace folders are ignored: this answers
/// whether a folder opened in the editor sits inside some other project.
#[must_use]
pub fn find_nearest_valid_ancestor_project(
    fs: &dyn FileSystem,
    start: &DocumentLocation,
) -> Option<ProjectRoot> {
    let mut current = parent_dir(start.as_path()?);
    while let Some(dir) = current {
        if is_valid_project_dir(fs, dir) {
            return Some(ProjectRoot::from_path(fs, dir));
        }
        current = parent_dir(dir);
    }
    None
}
