use std::sync::Arc;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use leanls_conf::Settings;
use leanls_source::FileSystem;
use tokio::sync::RwLock;
use tower_lsp_server::jsonrpc::Result as LspResult;
use tower_lsp_server::ls_types;
use tower_lsp_server::LanguageServer;
use tracing_appender::non_blocking::WorkerGuard;

use crate::client;
use crate::ext::UriExt;
use crate::process::ProcessFactory;
use crate::router::ServerFactory;
use crate::router::ServerHandle;
use crate::session::Session;

const SERVER_NAME: &str = "Lean 4 Project Router";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct LeanLanguageServer<F: ServerFactory + 'static = ProcessFactory> {
    session: Arc<RwLock<Session<F>>>,
    _log_guard: Option<WorkerGuard>,
}

impl LeanLanguageServer<ProcessFactory> {
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, log_guard: WorkerGuard) -> Self {
        let factory = ProcessFactory::new(Arc::clone(&fs));
        Self::with_factory(fs, factory, Some(log_guard))
    }
}

impl<F: ServerFactory + 'static> LeanLanguageServer<F> {
    pub fn with_factory(fs: Arc<dyn FileSystem>, factory: F, log_guard: Option<WorkerGuard>) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::new(fs, Settings::default(), factory))),
            _log_guard: log_guard,
        }
    }

    pub async fn with_session<R>(&self, f: impl FnOnce(&Session<F>) -> R) -> R {
        let session = self.session.read().await;
        f(&session)
    }

    pub async fn with_session_mut<R>(&self, f: impl FnOnce(&mut Session<F>) -> R) -> R {
        let mut session = self.session.write().await;
        f(&mut session)
    }

    async fn reload_settings(&self) {
        let base = self
            .with_session(|session| session.folders().iter().next().map(Utf8Path::to_path_buf))
            .await;
        let settings = load_settings(base.as_deref());
        self.with_session_mut(|session| session.set_settings(settings))
            .await;
    }

    async fn warn_about_folders(&self, folders: &[Utf8PathBuf]) {
        let warnings: Vec<String> = self
            .with_session(|session| {
                folders
                    .iter()
                    .filter_map(|folder| session.folder_warning(folder))
                    .collect()
            })
            .await;

        for warning in warnings {
            tracing::warn!("{warning}");
            client::show_message(ls_types::MessageType::WARNING, warning);
        }
    }
}

/// Settings for the session, read from `base` (the first workspace folder)
/// or the current directory.
fn load_settings(base: Option<&Utf8Path>) -> Settings {
    let base = match base {
        Some(base) => base.to_path_buf(),
        None => match std::env::current_dir()
            .ok()
            .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        {
            Some(dir) => dir,
            None => return Settings::default(),
        },
    };

    Settings::new(&base).unwrap_or_else(|err| {
        tracing::error!("Failed to load settings from {base}: {err}");
        Settings::default()
    })
}

fn folder_paths(folders: &[ls_types::WorkspaceFolder]) -> Vec<Utf8PathBuf> {
    folders
        .iter()
        .filter_map(|folder| {
            let path = folder.uri.to_utf8_path_buf();
            if path.is_none() {
                tracing::debug!("Ignoring non-file workspace folder {}", folder.uri.as_str());
            }
            path
        })
        .collect()
}

impl<F: ServerFactory + 'static> LanguageServer for LeanLanguageServer<F> {
    async fn initialize(
        &self,
        params: ls_types::InitializeParams,
    ) -> LspResult<ls_types::InitializeResult> {
        tracing::info!("Initializing server...");

        let folders = folder_paths(params.workspace_folders.as_deref().unwrap_or_default());
        let settings = load_settings(folders.first().map(Utf8PathBuf::as_path));

        self.with_session_mut(|session| {
            session.set_settings(settings);
            for folder in &folders {
                session.add_workspace_folder(folder);
            }
        })
        .await;

        Ok(ls_types::InitializeResult {
            capabilities: ls_types::ServerCapabilities {
                text_document_sync: Some(ls_types::TextDocumentSyncCapability::Options(
                    ls_types::TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(ls_types::TextDocumentSyncKind::NONE),
                        ..Default::default()
                    },
                )),
                workspace: Some(ls_types::WorkspaceServerCapabilities {
                    workspace_folders: Some(ls_types::WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(ls_types::OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            server_info: Some(ls_types::ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(SERVER_VERSION.to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _params: ls_types::InitializedParams) {
        tracing::info!("Server received initialized notification.");

        let folders: Vec<Utf8PathBuf> = self
            .with_session(|session| session.folders().iter().map(Utf8Path::to_path_buf).collect())
            .await;
        self.warn_about_folders(&folders).await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        tracing::info!("Shutting down all project servers");
        self.with_session_mut(Session::shutdown).await;
        Ok(())
    }

    async fn did_change_workspace_folders(&self, params: ls_types::DidChangeWorkspaceFoldersParams) {
        let removed = folder_paths(&params.event.removed);
        let added = folder_paths(&params.event.added);

        self.with_session_mut(|session| {
            for folder in &removed {
                let released = session.remove_workspace_folder(folder);
                tracing::info!(
                    "Removed workspace folder {folder}, stopped {} server(s)",
                    released.len()
                );
            }
            for folder in &added {
                session.add_workspace_folder(folder);
            }
        })
        .await;

        self.warn_about_folders(&added).await;
    }

    async fn did_open(&self, params: ls_types::DidOpenTextDocumentParams) {
        let location = params.text_document.uri.to_document_location();
        tracing::debug!("Opened document: {location}");

        let request = self.with_session(Session::route_request).await;
        let routed = {
            let location = location.clone();
            tokio::task::spawn_blocking(move || {
                let routed = request.run(&location);
                (request, routed)
            })
            .await
        };

        match routed {
            Ok((request, Ok((info, handle)))) => {
                tracing::info!(
                    "Routed {location} to {} ({})",
                    handle.spec().root,
                    info.resolved_by
                );
                let recorded = self
                    .with_session_mut(|session| {
                        session.record_routed(&request, location.clone(), info.root)
                    })
                    .await;
                if !recorded {
                    tracing::info!("Dropped route for {location}: its workspace folder was removed");
                }
            }
            Ok((_, Err(err))) => {
                tracing::error!("Failed to start a server for {location}: {err:#}");
            }
            Err(err) => {
                tracing::error!("Resolving {location} panicked: {err}");
            }
        }
    }

    async fn did_close(&self, params: ls_types::DidCloseTextDocumentParams) {
        let location = params.text_document.uri.to_document_location();
        let root = self
            .with_session_mut(|session| session.close_document(&location))
            .await;
        match root {
            Some(root) => tracing::debug!("Closed document: {location} (served by {root})"),
            None => tracing::debug!("Closed untracked document: {location}"),
        }
    }

    async fn did_change_configuration(&self, _params: ls_types::DidChangeConfigurationParams) {
        tracing::info!("Configuration change detected. Reloading settings...");
        self.reload_settings().await;
    }
}
