mod ancestors;
mod distribution;
mod folders;
mod resolve;
mod root;
#[cfg(test)]
mod testing;
mod toolchain;
mod version;

pub use ancestors::find_nearest_valid_ancestor_project;
pub use ancestors::is_valid_project;
pub use distribution::core_distribution_shape;
pub use distribution::is_core_distribution_root;
pub use distribution::CoreShape;
pub use folders::WorkspaceFolders;
pub use resolve::find_artifact_escape;
pub use resolve::find_project_root;
pub use resolve::Resolution;
pub use resolve::ResolvedBy;
pub use resolve::ARTIFACT_DIRS;
pub use root::ProjectRoot;
pub use toolchain::find_marker;
pub use toolchain::read_marker;
pub use toolchain::read_marker_file;
pub use toolchain::MarkerError;
pub use toolchain::ToolchainMarker;
pub use toolchain::VersionString;
pub use toolchain::TOOLCHAIN_FILE;
pub use version::resolve_version;
pub use version::VersionInfo;
