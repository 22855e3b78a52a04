use camino::Utf8Path;
use camino::Utf8PathBuf;
use leanls_source::FileSystem;

/// A filesystem that fails the test on any access.
pub(crate) struct NoAccessFileSystem;

impl FileSystem for NoAccessFileSystem {
    fn read_to_string(&self, path: &Utf8Path) -> std::io::Result<String> {
        panic!("unexpected read of {path}")
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        panic!("unexpected existence probe of {path}")
    }

    fn is_file(&self, path: &Utf8Path) -> bool {
        panic!("unexpected file probe of {path}")
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        panic!("unexpected directory probe of {path}")
    }

    fn canonicalize(&self, path: &Utf8Path) -> std::io::Result<Utf8PathBuf> {
        panic!("unexpected canonicalize of {path}")
    }
}
