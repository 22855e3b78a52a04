use camino::Utf8Path;
use camino::Utf8PathBuf;
use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable consulted when no default toolchain is configured.
pub const DEFAULT_TOOLCHAIN_ENV: &str = "DEFAULT_LEAN_TOOLCHAIN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ExternalConfigError),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    debug: bool,
    default_toolchain: Option<String>,
    toolchain_path: Option<Utf8PathBuf>,
    lake_path: Option<Utf8PathBuf>,
    enable_lake: bool,
    server_args: Vec<String>,
    show_invalid_project_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            default_toolchain: None,
            toolchain_path: None,
            lake_path: None,
            enable_lake: false,
            server_args: Vec::new(),
            show_invalid_project_warnings: true,
        }
    }
}

impl Settings {
    pub fn new(project_root: &Utf8Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("com.github", "leanprover", "leanls")
            .map(|proj_dirs| proj_dirs.config_dir().join("leanls.toml"))
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok());

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Utf8Path,
        user_config_path: Option<&Utf8Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(
                File::from(path.as_std_path())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            File::from(project_root.join(".leanls.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("leanls.toml").as_std_path())
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;

        if settings.default_toolchain.is_none() {
            settings.default_toolchain = std::env::var(DEFAULT_TOOLCHAIN_ENV)
                .ok()
                .filter(|s| !s.trim().is_empty());
            if let Some(toolchain) = &settings.default_toolchain {
                tracing::debug!("Using default toolchain from {DEFAULT_TOOLCHAIN_ENV}: {toolchain}");
            }
        }

        Ok(settings)
    }

    /// Surface the output of spawned servers at `info` rather than `debug`.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Toolchain to request when a project carries no `lean-toolchain`.
    #[must_use]
    pub fn default_toolchain(&self) -> Option<&str> {
        self.default_toolchain.as_deref()
    }

    /// A specific toolchain install to run instead of going through elan.
    #[must_use]
    pub fn toolchain_path(&self) -> Option<&Utf8Path> {
        self.toolchain_path.as_deref()
    }

    #[must_use]
    pub fn lake_path(&self) -> Option<&Utf8Path> {
        self.lake_path.as_deref()
    }

    #[must_use]
    pub fn enable_lake(&self) -> bool {
        self.enable_lake
    }

    #[must_use]
    pub fn server_args(&self) -> &[String] {
        &self.server_args
    }

    #[must_use]
    pub fn show_invalid_project_warnings(&self) -> bool {
        self.show_invalid_project_warnings
    }
}
