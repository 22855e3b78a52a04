use std::sync::Arc;

use camino::Utf8Path;
use leanls_conf::Settings;
use leanls_project::find_nearest_valid_ancestor_project;
use leanls_project::is_valid_project;
use leanls_project::resolve_version;
use leanls_project::ProjectRoot;
use leanls_project::VersionInfo;
use leanls_project::WorkspaceFolders;
use leanls_source::absolute_utf8_path;
use leanls_source::DocumentLocation;
use leanls_source::FileSystem;
use rustc_hash::FxHashMap;

use crate::router::Router;
use crate::router::ServerFactory;

/// Server-side state for one editor connection.
///
/// Tracks which root every open document was routed to. Servers for
/// projects on disk outlive their documents and are only stopped when the
/// workspace folder owning them goes away or the session shuts down. A
/// virtual root's server stops with its last document.
pub struct Session<F: ServerFactory> {
    fs: Arc<dyn FileSystem>,
    settings: Settings,
    folders: WorkspaceFolders,
    router: Arc<Router<F>>,
    documents: FxHashMap<DocumentLocation, ProjectRoot>,
}

impl<F: ServerFactory> Session<F> {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Settings, factory: F) -> Self {
        factory.configure(&settings);
        Self {
            fs,
            settings,
            folders: WorkspaceFolders::default(),
            router: Arc::new(Router::new(factory)),
            documents: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.router.factory().configure(&settings);
        self.settings = settings;
    }

    #[must_use]
    pub fn folders(&self) -> &WorkspaceFolders {
        &self.folders
    }

    #[must_use]
    pub fn router(&self) -> &Router<F> {
        &self.router
    }

    #[must_use]
    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    /// A detached copy of what routing a document needs, for running the
    /// filesystem walk away from the session lock.
    #[must_use]
    pub fn route_request(&self) -> RouteRequest<F> {
        RouteRequest {
            fs: Arc::clone(&self.fs),
            folders: self.folders.clone(),
            router: Arc::clone(&self.router),
        }
    }

    /// Resolve and route `location`, then remember it as open.
    pub fn open_document(
        &mut self,
        location: DocumentLocation,
    ) -> anyhow::Result<(VersionInfo, Arc<F::Handle>)> {
        let routed = self.route_request().run(&location)?;
        self.record_document(location, routed.0.root.clone());
        Ok(routed)
    }

    pub fn record_document(&mut self, location: DocumentLocation, root: ProjectRoot) {
        self.documents.insert(location, root);
    }

    /// Record the outcome of a [`RouteRequest`] that ran without the session.
    ///
    /// If the workspace folder owning `root` was removed in the meantime, the
    /// server the request started is stopped instead and `false` is returned.
    pub fn record_routed(
        &mut self,
        request: &RouteRequest<F>,
        location: DocumentLocation,
        root: ProjectRoot,
    ) -> bool {
        let owner = root.path().and_then(|path| request.folders.containing(path));
        let removed = owner.is_some_and(|owner| !self.folders.iter().any(|f| f == owner));

        if removed && !self.is_served(&root) {
            tracing::debug!("Workspace folder of {root} was removed while routing {location}");
            self.router.release(&root);
            return false;
        }
        self.record_document(location, root);
        true
    }

    /// Forget `location`. Returns the root it was routed to.
    pub fn close_document(&mut self, location: &DocumentLocation) -> Option<ProjectRoot> {
        let root = self.documents.remove(location)?;
        if root.is_virtual() && !self.is_served(&root) {
            self.router.release(&root);
        }
        Some(root)
    }

    fn is_served(&self, root: &ProjectRoot) -> bool {
        self.documents.values().any(|r| r == root)
    }

    #[must_use]
    pub fn document_root(&self, location: &DocumentLocation) -> Option<&ProjectRoot> {
        self.documents.get(location)
    }

    pub fn add_workspace_folder(&mut self, folder: &Utf8Path) -> bool {
        self.folders.add(folder)
    }

    /// Drop `folder`, stopping the servers for roots it owned and
    /// forgetting their documents. Roots owned by a folder nested inside it
    /// keep running.
    pub fn remove_workspace_folder(&mut self, folder: &Utf8Path) -> Vec<ProjectRoot> {
        let folder = absolute_utf8_path(folder);
        if !self.folders.remove(&folder) {
            return Vec::new();
        }
        let folders = &self.folders;
        let released = self.router.release_where(|root| {
            let Some(path) = root.path() else {
                return false;
            };
            path.starts_with(&folder)
                && !matches!(folders.containing(path), Some(owner) if owner.starts_with(&folder))
        });
        self.documents.retain(|_, root| !released.contains(root));
        released
    }

    /// The warning to show for a workspace folder that is not a project,
    /// if warnings are enabled.
    #[must_use]
    pub fn folder_warning(&self, folder: &Utf8Path) -> Option<String> {
        if !self.settings.show_invalid_project_warnings() {
            return None;
        }
        folder_warning(self.fs.as_ref(), folder)
    }

    pub fn shutdown(&mut self) {
        self.router.shutdown_all();
        self.documents.clear();
    }
}

/// Why `folder` is not a usable project, or `None` if it is one.
#[must_use]
pub fn folder_warning(fs: &dyn FileSystem, folder: &Utf8Path) -> Option<String> {
    let location = DocumentLocation::file(folder);
    if is_valid_project(fs, &location) {
        return None;
    }
    let folder = location.as_path()?;

    Some(match find_nearest_valid_ancestor_project(fs, &location) {
        Some(ancestor) => format!(
            "`{folder}` is not a Lean 4 project, but `{ancestor}` above it is. Open that folder instead."
        ),
        None => format!("`{folder}` does not contain a Lean 4 project (no `lean-toolchain`)."),
    })
}

pub struct RouteRequest<F: ServerFactory> {
    fs: Arc<dyn FileSystem>,
    folders: WorkspaceFolders,
    router: Arc<Router<F>>,
}

impl<F: ServerFactory> RouteRequest<F> {
    pub fn run(&self, location: &DocumentLocation) -> anyhow::Result<(VersionInfo, Arc<F::Handle>)> {
        let info = resolve_version(self.fs.as_ref(), &self.folders, location);
        let handle = self.router.route(&info)?;
        Ok((info, handle))
    }
}

#[cfg(test)]
mod tests {
    use leanls_source::InMemoryFileSystem;

    use super::*;
    use crate::router::testing::CountingFactory;
    use crate::router::ServerHandle;

    fn workspace() -> InMemoryFileSystem {
        let mut fs = InMemoryFileSystem::new();
        fs.add_file("/ws/a/lean-toolchain".into(), "4.0.0\n".to_string());
        fs.add_file("/ws/a/A.lean".into(), String::new());
        fs.add_file("/ws/a/sub/B.lean".into(), String::new());
        fs.add_file("/ws/b/lean-toolchain".into(), "4.1.0\n".to_string());
        fs.add_file("/ws/b/C.lean".into(), String::new());
        fs.add_dir("/ws/a/Nested".into());
        fs.add_dir("/stray".into());
        fs
    }

    fn session(fs: InMemoryFileSystem) -> Session<CountingFactory> {
        let mut session = Session::new(Arc::new(fs), Settings::default(), CountingFactory::default());
        session.add_workspace_folder(Utf8Path::new("/ws"));
        session
    }

    #[test]
    fn test_documents_in_one_project_share_a_server() {
        let mut session = session(workspace());

        let (info, first) = session.open_document(DocumentLocation::file("/ws/a/A.lean")).unwrap();
        let (_, second) = session
            .open_document(DocumentLocation::file("/ws/a/sub/B.lean"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(info.version.as_deref(), Some("4.0.0"));
        assert_eq!(first.spec().toolchain.as_deref(), Some("4.0.0"));
        assert_eq!(session.router().factory().spawned(), 1);
    }

    #[test]
    fn test_each_project_gets_its_own_server() {
        let mut session = session(workspace());

        session.open_document(DocumentLocation::file("/ws/a/A.lean")).unwrap();
        session.open_document(DocumentLocation::file("/ws/b/C.lean")).unwrap();
        assert_eq!(session.router().len(), 2);
    }

    #[test]
    fn test_closing_forgets_document_but_keeps_server() {
        let mut session = session(workspace());
        let location = DocumentLocation::file("/ws/a/A.lean");

        session.open_document(location.clone()).unwrap();
        let root = session.close_document(&location).unwrap();
        assert_eq!(root.path(), Some(Utf8Path::new("/ws/a")));
        assert!(session.document_root(&location).is_none());
        assert!(session.router().contains(&root));
        assert!(session.close_document(&location).is_none());
    }

    #[test]
    fn test_removing_folder_stops_its_servers() {
        let mut fs = workspace();
        fs.add_file("/other/lean-toolchain".into(), "4.2.0".to_string());
        fs.add_file("/other/D.lean".into(), String::new());
        let mut session = session(fs);
        session.add_workspace_folder(Utf8Path::new("/other"));

        let a = DocumentLocation::file("/ws/a/A.lean");
        let d = DocumentLocation::file("/other/D.lean");
        let (_, ws_server) = session.open_document(a.clone()).unwrap();
        let (_, other_server) = session.open_document(d.clone()).unwrap();

        let released = session.remove_workspace_folder(Utf8Path::new("/ws"));
        assert_eq!(released.len(), 1);
        assert!(ws_server.is_stopped());
        assert!(!other_server.is_stopped());
        assert!(session.document_root(&a).is_none());
        assert!(session.document_root(&d).is_some());

        assert!(session.remove_workspace_folder(Utf8Path::new("/ws")).is_empty());
    }

    #[test]
    fn test_removing_outer_folder_keeps_nested_folder_servers() {
        let mut session = session(workspace());
        session.add_workspace_folder(Utf8Path::new("/ws/a"));

        let a = DocumentLocation::file("/ws/a/A.lean");
        let c = DocumentLocation::file("/ws/b/C.lean");
        let (_, nested) = session.open_document(a.clone()).unwrap();
        let (_, outer) = session.open_document(c.clone()).unwrap();

        let released = session.remove_workspace_folder(Utf8Path::new("/ws"));
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].path(), Some(Utf8Path::new("/ws/b")));
        assert!(!nested.is_stopped());
        assert!(outer.is_stopped());
        assert!(session.document_root(&a).is_some());
        assert!(session.document_root(&c).is_none());
    }

    #[test]
    fn test_removing_nested_folder_stops_its_servers() {
        let mut session = session(workspace());
        session.add_workspace_folder(Utf8Path::new("/ws/a"));

        let (_, handle) = session.open_document(DocumentLocation::file("/ws/a/A.lean")).unwrap();
        let released = session.remove_workspace_folder(Utf8Path::new("/ws/a/"));
        assert_eq!(released.len(), 1);
        assert!(handle.is_stopped());
    }

    #[test]
    fn test_route_finishing_after_folder_removal_is_dropped() {
        let mut session = session(workspace());
        let location = DocumentLocation::file("/ws/a/A.lean");

        let request = session.route_request();
        session.remove_workspace_folder(Utf8Path::new("/ws"));
        let (info, handle) = request.run(&location).unwrap();

        assert!(!session.record_routed(&request, location.clone(), info.root));
        assert!(handle.is_stopped());
        assert!(session.router().is_empty());
        assert!(session.document_root(&location).is_none());
    }

    #[test]
    fn test_route_finishing_after_folder_added_is_kept() {
        let mut session = session(workspace());
        let location = DocumentLocation::file("/ws/a/A.lean");

        let request = session.route_request();
        session.add_workspace_folder(Utf8Path::new("/ws/a"));
        let (info, handle) = request.run(&location).unwrap();

        assert!(session.record_routed(&request, location.clone(), info.root));
        assert!(!handle.is_stopped());
        assert!(session.document_root(&location).is_some());
    }

    #[test]
    fn test_closing_last_virtual_document_stops_its_server() {
        let mut session = session(workspace());

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let location = DocumentLocation::virtual_uri(format!("untitled:Untitled-{i}"));
                let (_, handle) = session.open_document(location.clone()).unwrap();
                session.close_document(&location);
                handle
            })
            .collect();

        assert!(session.router().is_empty());
        assert!(handles.iter().all(|handle| handle.is_stopped()));
    }

    #[test]
    fn test_virtual_documents_route_to_themselves() {
        let mut session = session(workspace());
        let location = DocumentLocation::virtual_uri("untitled:Untitled-1");

        let (info, handle) = session.open_document(location.clone()).unwrap();
        assert_eq!(info.root.location(), &location);
        assert_eq!(handle.spec().toolchain, None);
    }

    #[test]
    fn test_spawn_failure_leaves_document_unrouted() {
        let mut session = Session::new(
            Arc::new(workspace()),
            Settings::default(),
            CountingFactory {
                fail: true,
                ..CountingFactory::default()
            },
        );
        let location = DocumentLocation::file("/ws/a/A.lean");

        assert!(session.open_document(location.clone()).is_err());
        assert!(session.document_root(&location).is_none());
    }

    #[test]
    fn test_folder_warnings() {
        let session = session(workspace());

        assert_eq!(session.folder_warning(Utf8Path::new("/ws/a")), None);
        assert_eq!(
            session.folder_warning(Utf8Path::new("/ws/a/Nested")).unwrap(),
            "`/ws/a/Nested` is not a Lean 4 project, but `/ws/a` above it is. Open that folder instead."
        );
        assert_eq!(
            session.folder_warning(Utf8Path::new("/stray")).unwrap(),
            "`/stray` does not contain a Lean 4 project (no `lean-toolchain`)."
        );
    }

    #[test]
    fn test_shutdown_stops_all_servers() {
        let mut session = session(workspace());
        let (_, a) = session.open_document(DocumentLocation::file("/ws/a/A.lean")).unwrap();
        let (_, b) = session.open_document(DocumentLocation::file("/ws/b/C.lean")).unwrap();

        session.shutdown();
        assert!(a.is_stopped());
        assert!(b.is_stopped());
        assert!(session.router().is_empty());
    }
}
