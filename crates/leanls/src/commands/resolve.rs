use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use leanls_project::resolve_version;
use leanls_project::VersionInfo;
use leanls_project::WorkspaceFolders;
use leanls_source::DocumentLocation;
use leanls_source::OsFileSystem;

use crate::args::Args;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Resolve {
    /// Files or directories to resolve.
    #[arg(required = true)]
    paths: Vec<Utf8PathBuf>,

    /// Workspace folder that resolution must not walk above. Repeatable.
    #[arg(long = "workspace-folder", value_name = "DIR")]
    workspace_folders: Vec<Utf8PathBuf>,

    /// Print a JSON array instead of one line per path.
    #[arg(long)]
    json: bool,
}

impl Command for Resolve {
    fn execute(&self, args: &Args) -> Result<Exit> {
        let folders = WorkspaceFolders::new(&self.workspace_folders);

        let resolved: Vec<(DocumentLocation, VersionInfo)> = self
            .paths
            .iter()
            .map(|path| {
                let location = DocumentLocation::file(path);
                let info = resolve_version(&OsFileSystem, &folders, &location);
                (location, info)
            })
            .collect();

        if self.json {
            let entries: Vec<serde_json::Value> = resolved
                .iter()
                .map(|(location, info)| {
                    serde_json::json!({
                        "path": location,
                        "root": info.root,
                        "version": info.version,
                        "resolved_by": info.resolved_by,
                    })
                })
                .collect();
            let json = serde_json::to_string_pretty(&entries)
                .context("Failed to serialize resolution results")?;
            println!("{json}");
        } else if !args.global.quiet {
            for (location, info) in &resolved {
                println!("{}", describe(location, info));
            }
        }

        Ok(Exit::success())
    }
}

fn describe(location: &DocumentLocation, info: &VersionInfo) -> String {
    let version = match info.version.as_deref() {
        Some(version) if !version.is_empty() => version,
        _ => "no toolchain",
    };
    format!("{location} → {} ({version}) [{}]", info.root, info.resolved_by)
}
