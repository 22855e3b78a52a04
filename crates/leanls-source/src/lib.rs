mod location;
mod path;
mod system;

pub use location::DocumentLocation;
pub use path::absolute_utf8_path;
pub use path::clean_utf8_path;
pub use path::has_dir_name;
pub use path::parent_dir;
pub use path::Utf8PathClean;
pub use system::FileSystem;
pub use system::InMemoryFileSystem;
pub use system::OsFileSystem;
