use std::io;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::path::clean_utf8_path;
use crate::path::parent_dir;

/// The host's filesystem, as seen by project resolution.
///
/// Every probe is infallible from the caller's point of view except reads:
/// a path that cannot be inspected simply does not exist.
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String>;
    fn exists(&self, path: &Utf8Path) -> bool;
    fn is_file(&self, path: &Utf8Path) -> bool;
    fn is_dir(&self, path: &Utf8Path) -> bool;
    /// Resolve symlinks and normalize spelling so two paths naming the same
    /// directory compare equal.
    fn canonicalize(&self, path: &Utf8Path) -> io::Result<Utf8PathBuf>;
}

/// An in-memory tree of files and directories.
///
/// Adding a file registers all of its ancestors as directories.
pub struct InMemoryFileSystem {
    files: FxHashMap<Utf8PathBuf, String>,
    dirs: FxHashSet<Utf8PathBuf>,
}

impl InMemoryFileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: FxHashMap::default(),
            dirs: FxHashSet::default(),
        }
    }

    pub fn add_file(&mut self, path: Utf8PathBuf, content: String) {
        let path = clean_utf8_path(&path);
        self.add_ancestors(&path);
        self.files.insert(path, content);
    }

    pub fn add_dir(&mut self, path: Utf8PathBuf) {
        let path = clean_utf8_path(&path);
        self.add_ancestors(&path);
        self.dirs.insert(path);
    }

    fn add_ancestors(&mut self, path: &Utf8Path) {
        let mut current = parent_dir(path);
        while let Some(dir) = current {
            if !self.dirs.insert(dir.to_path_buf()) {
                break;
            }
            current = parent_dir(dir);
        }
    }
}

impl Default for InMemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        self.files
            .get(&clean_utf8_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        self.files.contains_key(&clean_utf8_path(path))
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        let path = clean_utf8_path(path);
        parent_dir(&path).is_none() || self.dirs.contains(&path)
    }

    fn canonicalize(&self, path: &Utf8Path) -> io::Result<Utf8PathBuf> {
        let path = clean_utf8_path(path);
        if self.exists(&path) {
            Ok(path)
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "Path not found"))
        }
    }
}

/// Standard file system implementation that uses [`std::fs`].
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Utf8Path) -> io::Result<Utf8PathBuf> {
        let canonical = dunce::canonicalize(path)?;
        Utf8PathBuf::from_path_buf(canonical).map_err(|path| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non-UTF-8 path: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod in_memory {
        use super::*;

        #[test]
        fn test_read_existing_file() {
            let mut fs = InMemoryFileSystem::new();
            fs.add_file("/proj/lean-toolchain".into(), "leanprover/lean4:v4.0.0".to_string());

            assert_eq!(
                fs.read_to_string(Utf8Path::new("/proj/lean-toolchain"))
                    .unwrap(),
                "leanprover/lean4:v4.0.0"
            );
        }

        #[test]
        fn test_read_nonexistent_file() {
            let fs = InMemoryFileSystem::new();

            let result = fs.read_to_string(Utf8Path::new("/missing.lean"));
            assert!(result.is_err());
            assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        }

        #[test]
        fn test_adding_file_creates_parent_dirs() {
            let mut fs = InMemoryFileSystem::new();
            fs.add_file("/ws/proj/src/Main.lean".into(), String::new());

            assert!(fs.is_dir(Utf8Path::new("/ws/proj/src")));
            assert!(fs.is_dir(Utf8Path::new("/ws")));
            assert!(fs.is_file(Utf8Path::new("/ws/proj/src/Main.lean")));
            assert!(!fs.is_dir(Utf8Path::new("/ws/proj/src/Main.lean")));
        }

        #[test]
        fn test_exists_covers_files_and_dirs() {
            let mut fs = InMemoryFileSystem::new();
            fs.add_dir("/lean4/src".into());
            fs.add_file("/lean4/LICENSE".into(), String::new());

            assert!(fs.exists(Utf8Path::new("/lean4/src")));
            assert!(fs.exists(Utf8Path::new("/lean4/LICENSE")));
            assert!(!fs.exists(Utf8Path::new("/lean4/LICENSES")));
        }

        #[test]
        fn test_lookups_ignore_trailing_separators() {
            let mut fs = InMemoryFileSystem::new();
            fs.add_dir("/ws/proj".into());

            assert!(fs.is_dir(Utf8Path::new("/ws/proj/")));
            assert_eq!(
                fs.canonicalize(Utf8Path::new("/ws/./proj/")).unwrap(),
                Utf8PathBuf::from("/ws/proj")
            );
        }

        #[test]
        fn test_canonicalize_missing_path_fails() {
            let fs = InMemoryFileSystem::new();
            assert!(fs.canonicalize(Utf8Path::new("/nowhere")).is_err());
        }
    }

    mod os {
        use super::*;

        #[test]
        fn test_probes_real_directory() {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            std::fs::write(root.join("lean-toolchain"), "v4.0.0\n").unwrap();

            let fs = OsFileSystem;
            assert!(fs.is_dir(&root));
            assert!(fs.is_file(&root.join("lean-toolchain")));
            assert!(!fs.exists(&root.join("missing")));
            assert_eq!(
                fs.read_to_string(&root.join("lean-toolchain")).unwrap(),
                "v4.0.0\n"
            );
        }

        #[test]
        fn test_canonicalize_collapses_dot_segments() {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            std::fs::create_dir_all(root.join("a/b")).unwrap();

            let fs = OsFileSystem;
            assert_eq!(
                fs.canonicalize(&root.join("a/b/..")).unwrap(),
                fs.canonicalize(&root.join("a")).unwrap()
            );
        }
    }
}
