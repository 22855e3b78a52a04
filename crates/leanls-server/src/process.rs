use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

use anyhow::Context;
use camino::Utf8PathBuf;
use leanls_conf::Settings;
use leanls_source::FileSystem;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStderr;
use tokio::process::Command;

use crate::router::ServerFactory;
use crate::router::ServerHandle;
use crate::router::ServerSpec;

const LAKEFILES: [&str; 2] = ["lakefile.lean", "lakefile.toml"];

/// The parts of [`Settings`] that decide how a server is launched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub toolchain_path: Option<Utf8PathBuf>,
    pub lake_path: Option<Utf8PathBuf>,
    pub enable_lake: bool,
    pub default_toolchain: Option<String>,
    pub server_args: Vec<String>,
    /// Log server stderr at `info` so it reaches the client.
    pub debug: bool,
}

impl From<&Settings> for LaunchOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            toolchain_path: settings.toolchain_path().map(ToOwned::to_owned),
            lake_path: settings.lake_path().map(ToOwned::to_owned),
            enable_lake: settings.enable_lake(),
            default_toolchain: settings.default_toolchain().map(ToString::to_string),
            server_args: settings.server_args().to_vec(),
            debug: settings.debug(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// `None` for virtual roots, which run in the current directory.
    pub cwd: Option<Utf8PathBuf>,
}

impl LaunchOptions {
    #[must_use]
    pub fn command(&self, fs: &dyn FileSystem, spec: &ServerSpec) -> ServerCommand {
        let root = spec.root.path();
        let use_lake = self.enable_lake
            && root.is_some_and(|root| LAKEFILES.iter().any(|f| fs.is_file(&root.join(f))));

        let (program, mut args) = if use_lake {
            let lake = match (&self.lake_path, &self.toolchain_path) {
                (Some(lake), _) => lake.to_string(),
                (None, Some(toolchain)) => toolchain.join("bin").join("lake").into_string(),
                (None, None) => "lake".to_string(),
            };
            (lake, vec!["serve".to_string(), "--".to_string()])
        } else {
            let lean = match &self.toolchain_path {
                Some(toolchain) => toolchain.join("bin").join("lean").into_string(),
                None => "lean".to_string(),
            };
            (lean, vec!["--server".to_string()])
        };

        // An explicit toolchain path bypasses elan, so there is nothing to override.
        if self.toolchain_path.is_none() {
            let toolchain = spec
                .toolchain
                .as_deref()
                .or(self.default_toolchain.as_deref());
            if let Some(toolchain) = toolchain {
                args.insert(0, format!("+{toolchain}"));
            }
        }

        args.extend(self.server_args.iter().cloned());

        ServerCommand {
            program,
            args,
            cwd: root.map(ToOwned::to_owned),
        }
    }
}

/// Launches `lean --server` (or `lake serve`) processes.
pub struct ProcessFactory {
    fs: Arc<dyn FileSystem>,
    options: RwLock<LaunchOptions>,
}

impl ProcessFactory {
    /// Launch options start empty; the session installs them through
    /// [`ServerFactory::configure`].
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            options: RwLock::new(LaunchOptions::default()),
        }
    }

    fn options(&self) -> LaunchOptions {
        match self.options.read() {
            Ok(options) => options.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ServerFactory for ProcessFactory {
    type Handle = ProcessHandle;

    fn spawn(&self, spec: &ServerSpec) -> anyhow::Result<ProcessHandle> {
        let options = self.options();
        let command = options.command(self.fs.as_ref(), spec);
        tracing::debug!(
            "Spawning `{} {}` for {}",
            command.program,
            command.args.join(" "),
            spec.root
        );

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            process.current_dir(cwd);
        }

        let mut child = process
            .spawn()
            .with_context(|| format!("failed to start `{}` for {}", command.program, spec.root))?;

        if let Some(stderr) = child.stderr.take() {
            forward_stderr(stderr, spec.root.to_string(), options.debug);
        }

        Ok(ProcessHandle {
            spec: spec.clone(),
            child: Mutex::new(child),
        })
    }

    fn configure(&self, settings: &Settings) {
        let options = LaunchOptions::from(settings);
        match self.options.write() {
            Ok(mut current) => *current = options,
            Err(poisoned) => *poisoned.into_inner() = options,
        }
    }
}

fn forward_stderr(stderr: ChildStderr, root: String, verbose: bool) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        return;
    };
    runtime.spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if verbose {
                tracing::info!("[{root}] {line}");
            } else {
                tracing::debug!("[{root}] {line}");
            }
        }
    });
}

pub struct ProcessHandle {
    spec: ServerSpec,
    child: Mutex<Child>,
}

impl ProcessHandle {
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.lock().ok().and_then(|child| child.id())
    }
}

impl ServerHandle for ProcessHandle {
    fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    fn shutdown(&self) {
        let Ok(mut child) = self.child.lock() else {
            return;
        };
        if let Err(err) = child.start_kill() {
            tracing::warn!("Failed to stop server for {}: {err}", self.spec.root);
        }
    }
}
