//! Recognizing the Lean implementation's own source tree.
//!
//! A checkout of the compiler (or an unpacked nightly) has no
//! `lean-toolchain` of its own. It is identified purely by the entries
//! sitting directly inside it. This is a heuristic: any directory that
//! happens to contain the same names is treated the same way.

use camino::Utf8Path;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;

/// The directory shapes that identify a core distribution root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreShape {
    /// A released distribution or the repository root: `LICENSE`,
    /// `LICENSES` and `src`.
    Distribution,
    /// The `src` directory of the repository: `Init`, `Lean`, `kernel`
    /// and `runtime`.
    Source,
}

impl CoreShape {
    /// Tried in this order; the first match wins.
    pub const ALL: [CoreShape; 2] = [CoreShape::Distribution, CoreShape::Source];

    #[must_use]
    pub fn entries(self) -> &'static [&'static str] {
        match self {
            CoreShape::Distribution => &["LICENSE", "LICENSES", "src"],
            CoreShape::Source => &["Init", "Lean", "kernel", "runtime"],
        }
    }

    /// Every entry must exist directly under `dir`, as a file or a directory.
    #[must_use]
    pub fn matches(self, fs: &dyn FileSystem, dir: &Utf8Path) -> bool {
        self.entries()
            .iter()
            .all(|entry| fs.exists(&dir.join(entry)))
    }
}

/// The shape `dir` matches, if any.
#[must_use]
pub fn core_shape_at(fs: &dyn FileSystem, dir: &Utf8Path) -> Option<CoreShape> {
    CoreShape::ALL
        .into_iter()
        .find(|shape| shape.matches(fs, dir))
}

/// Like [`core_shape_at`], but virtual locations never match and are not
/// probed.
#[must_use]
pub fn core_distribution_shape(
    fs: &dyn FileSystem,
    location: &DocumentLocation,
) -> Option<CoreShape> {
    core_shape_at(fs, location.as_path()?)
}

#[must_use]
pub fn is_core_distribution_root(fs: &dyn FileSystem, location: &DocumentLocation) -> bool {
    core_distribution_shape(fs, location).is_some()
}

#[cfg(test)]
mod tests {
    use leanls_source::InMemoryFileSystem;

    use super::*;
    use crate::testing::NoAccessFileSystem;

    fn fs_with(root: &str, entries: &[&str]) -> InMemoryFileSystem {
        let mut fs = InMemoryFileSystem::new();
        fs.add_dir(root.into());
        for entry in entries {
            fs.add_dir(format!("{root}/{entry}").into());
        }
        fs
    }

    #[test]
    fn test_distribution_shape() {
        let mut fs = fs_with("/lean4", &["LICENSES", "src"]);
        fs.add_file("/lean4/LICENSE".into(), "Apache".to_string());

        let location = DocumentLocation::file("/lean4");
        assert_eq!(
            core_distribution_shape(&fs, &location),
            Some(CoreShape::Distribution)
        );
        assert!(is_core_distribution_root(&fs, &location));
    }

    #[test]
    fn test_source_shape() {
        let fs = fs_with("/lean4/src", &["Init", "Lean", "kernel", "runtime"]);
        assert_eq!(
            core_distribution_shape(&fs, &DocumentLocation::file("/lean4/src")),
            Some(CoreShape::Source)
        );
    }

    #[test]
    fn test_partial_shape_does_not_match() {
        let fs = fs_with("/lean4/src", &["Init", "Lean", "kernel"]);
        assert!(!is_core_distribution_root(
            &fs,
            &DocumentLocation::file("/lean4/src")
        ));

        let fs = fs_with("/proj", &["LICENSE", "src"]);
        assert!(!is_core_distribution_root(
            &fs,
            &DocumentLocation::file("/proj")
        ));
    }

    #[test]
    fn test_entries_must_be_direct_children() {
        let fs = fs_with("/proj", &["nested/LICENSE", "nested/LICENSES", "nested/src"]);
        assert!(!is_core_distribution_root(
            &fs,
            &DocumentLocation::file("/proj")
        ));
    }

    #[test]
    fn test_lookalike_directory_is_accepted() {
        // Names only, contents are never inspected.
        let mut fs = InMemoryFileSystem::new();
        fs.add_file("/notes/LICENSE".into(), String::new());
        fs.add_file("/notes/LICENSES".into(), String::new());
        fs.add_file("/notes/src".into(), String::new());

        assert!(is_core_distribution_root(
            &fs,
            &DocumentLocation::file("/notes")
        ));
    }

    #[test]
    fn test_virtual_location_is_never_core() {
        assert!(!is_core_distribution_root(
            &NoAccessFileSystem,
            &DocumentLocation::virtual_uri("untitled:Untitled-1")
        ));
    }
}
