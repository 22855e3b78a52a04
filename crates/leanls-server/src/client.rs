use std::fmt::Display;
use std::sync::Arc;
use std::sync::OnceLock;

use tower_lsp_server::ls_types::MessageType;
use tower_lsp_server::Client;

static CLIENT: OnceLock<Arc<Client>> = OnceLock::new();

pub fn init_client(client: Client) {
    if CLIENT.set(Arc::new(client)).is_err() {
        tracing::warn!("LSP client already initialized, keeping the first one");
    }
}

fn get_client() -> Option<Arc<Client>> {
    CLIENT.get().cloned()
}

/// Generates a fire-and-forget notification function that spawns an async task.
///
/// This...
/// ```rust,ignore
/// notify!(log_message, message_type: MessageType, message: impl Display + Send + 'static);
/// ```
///
/// ...expands to:
/// ```rust,ignore
/// pub fn log_message(message_type: MessageType, message: impl Display + Send + 'static) {
///     if let Some(client) = get_client() {
///         tokio::spawn(async move {
///             client.log_message(message_type, message).await;
///         });
///     }
/// }
/// ```
macro_rules! notify {
    ($name:ident, $($param:ident: $type:ty),*) => {
        pub fn $name($($param: $type),*) {
            if let Some(client) = get_client() {
                tokio::spawn(async move {
                    client.$name($($param),*).await;
                });
            }
        }
    };
}

notify!(log_message, message_type: MessageType, message: impl Display + Send + 'static);
notify!(show_message, message_type: MessageType, message: impl Display + Send + 'static);
