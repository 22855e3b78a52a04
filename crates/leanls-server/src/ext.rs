use camino::Utf8PathBuf;
use leanls_source::DocumentLocation;
use tower_lsp_server::ls_types;

pub(crate) trait UriExt {
    /// Convert LSP URI directly to `Utf8PathBuf` (convenience)
    fn to_utf8_path_buf(&self) -> Option<Utf8PathBuf>;

    /// `file` URIs become filesystem locations; anything else, or a file URI
    /// that does not decode to a UTF-8 path, is kept as a virtual location.
    fn to_document_location(&self) -> DocumentLocation;
}

impl UriExt for ls_types::Uri {
    fn to_utf8_path_buf(&self) -> Option<Utf8PathBuf> {
        if !self.as_str().starts_with("file:") {
            tracing::trace!(
                "URI conversion to path failed for: {} (non-file scheme)",
                self.as_str()
            );
            return None;
        }

        let path = self.to_file_path()?;

        Utf8PathBuf::from_path_buf(path.into_owned())
            .inspect_err(|_| {
                tracing::trace!(
                    "URI conversion to path failed for: {} (non-UTF-8 path)",
                    self.as_str()
                );
            })
            .ok()
    }

    fn to_document_location(&self) -> DocumentLocation {
        match self.to_utf8_path_buf() {
            Some(path) => DocumentLocation::file(path),
            None => DocumentLocation::virtual_uri(self.as_str()),
        }
    }
}
