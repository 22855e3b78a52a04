//! The routing table: one language server per project root.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use leanls_conf::Settings;
use leanls_project::ProjectRoot;
use leanls_project::VersionInfo;
use leanls_project::VersionString;

/// What a server process is started for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSpec {
    pub root: ProjectRoot,
    /// Toolchain requested by the root's `lean-toolchain`. An empty marker
    /// counts as no request.
    pub toolchain: Option<VersionString>,
}

impl From<&VersionInfo> for ServerSpec {
    fn from(info: &VersionInfo) -> Self {
        Self {
            root: info.root.clone(),
            toolchain: info.version.clone().filter(|v| !v.is_empty()),
        }
    }
}

pub trait ServerHandle: Send + Sync {
    fn spec(&self) -> &ServerSpec;

    /// Stop the server. Called once, when its root is released.
    fn shutdown(&self);
}

pub trait ServerFactory: Send + Sync {
    type Handle: ServerHandle + 'static;

    fn spawn(&self, spec: &ServerSpec) -> anyhow::Result<Self::Handle>;

    /// Settings changed. Only servers spawned afterwards see the change.
    fn configure(&self, _settings: &Settings) {}
}

/// Owns every running server, keyed by the root it serves.
pub struct Router<F: ServerFactory> {
    factory: F,
    servers: DashMap<ProjectRoot, Arc<F::Handle>>,
}

impl<F: ServerFactory> Router<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            servers: DashMap::new(),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The server for `info.root`, spawning it on first use.
    ///
    /// The lookup and the spawn happen under the same shard lock, so
    /// concurrent first requests for one root start exactly one server. A
    /// root keeps the toolchain it was first spawned with.
    pub fn route(&self, info: &VersionInfo) -> anyhow::Result<Arc<F::Handle>> {
        match self.servers.entry(info.root.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let spec = ServerSpec::from(info);
                let handle = Arc::new(self.factory.spawn(&spec)?);
                tracing::info!(
                    "Started server for {} ({})",
                    spec.root,
                    spec.toolchain.as_deref().unwrap_or("default toolchain")
                );
                entry.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    #[must_use]
    pub fn get(&self, root: &ProjectRoot) -> Option<Arc<F::Handle>> {
        self.servers.get(root).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn contains(&self, root: &ProjectRoot) -> bool {
        self.servers.contains_key(root)
    }

    pub fn roots(&self) -> Vec<ProjectRoot> {
        self.servers.iter().map(|entry| entry.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Stop the server for `root`, if one is running.
    pub fn release(&self, root: &ProjectRoot) -> bool {
        match self.servers.remove(root) {
            Some((_, handle)) => {
                tracing::info!("Stopping server for {root}");
                handle.shutdown();
                true
            }
            None => false,
        }
    }

    /// Stop every server whose root matches `predicate`. Returns the
    /// released roots.
    pub fn release_where(&self, mut predicate: impl FnMut(&ProjectRoot) -> bool) -> Vec<ProjectRoot> {
        let roots: Vec<ProjectRoot> = self
            .servers
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        roots.into_iter().filter(|root| self.release(root)).collect()
    }

    pub fn shutdown_all(&self) {
        for root in self.roots() {
            self.release(&root);
        }
    }
}
