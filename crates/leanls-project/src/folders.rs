use camino::Utf8Path;
use camino::Utf8PathBuf;
use leanls_source::absolute_utf8_path;

/// Workspace folders declared by the editor.
///
/// Resolution never walks above the folder containing its starting point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkspaceFolders {
    folders: Vec<Utf8PathBuf>,
}

impl WorkspaceFolders {
    #[must_use]
    pub fn new<I, P>(folders: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let mut this = Self::default();
        for folder in folders {
            this.add(folder.as_ref());
        }
        this
    }

    /// Returns `false` if the folder was already present.
    pub fn add(&mut self, folder: &Utf8Path) -> bool {
        let folder = absolute_utf8_path(folder);
        if self.folders.contains(&folder) {
            return false;
        }
        self.folders.push(folder);
        true
    }

    /// Returns `false` if the folder was not present.
    pub fn remove(&mut self, folder: &Utf8Path) -> bool {
        let folder = absolute_utf8_path(folder);
        let before = self.folders.len();
        self.folders.retain(|f| *f != folder);
        self.folders.len() != before
    }

    /// The innermost folder at or above `path`.
    #[must_use]
    pub fn containing(&self, path: &Utf8Path) -> Option<&Utf8Path> {
        self.folders
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .map(Utf8PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        self.folders.iter().map(Utf8PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}
