mod client;
mod ext;
mod logging;
mod process;
mod router;
mod server;
mod session;

use std::sync::Arc;

use anyhow::Result;
use leanls_source::OsFileSystem;
use tower_lsp_server::LspService;
use tower_lsp_server::Server;

pub use crate::logging::init_tracing;
pub use crate::logging::LspLayer;
pub use crate::process::LaunchOptions;
pub use crate::process::ProcessFactory;
pub use crate::process::ProcessHandle;
pub use crate::process::ServerCommand;
pub use crate::router::Router;
pub use crate::router::ServerFactory;
pub use crate::router::ServerHandle;
pub use crate::router::ServerSpec;
pub use crate::server::LeanLanguageServer;
pub use crate::session::folder_warning;
pub use crate::session::RouteRequest;
pub use crate::session::Session;

/// Run the router as a language server over stdio until the client exits.
pub async fn serve() -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(|client| {
        client::init_client(client);

        let log_guard = logging::init_tracing(|message_type, message| {
            client::log_message(message_type, message);
        });

        LeanLanguageServer::new(Arc::new(OsFileSystem), log_guard)
    })
    .finish();

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
