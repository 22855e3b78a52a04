use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use leanls_server::folder_warning;
use leanls_source::FileSystem;
use leanls_source::OsFileSystem;

use crate::args::Args;
use crate::commands::Command;
use crate::exit::Exit;

#[derive(Debug, Parser)]
pub struct Check {
    /// Folders that would be opened as workspace folders.
    #[arg(required = true)]
    folders: Vec<Utf8PathBuf>,
}

impl Command for Check {
    fn execute(&self, args: &Args) -> Result<Exit> {
        let fs = OsFileSystem;
        let mut invalid = 0;

        for folder in &self.folders {
            let problem = if fs.is_dir(folder) {
                folder_warning(&fs, folder)
            } else {
                Some(format!("`{folder}` is not a directory."))
            };

            if let Some(problem) = problem {
                invalid += 1;
                if !args.global.quiet {
                    println!("warning: {problem}");
                }
            }
        }

        if invalid == 0 {
            return Ok(Exit::success());
        }

        let word = if invalid == 1 { "folder" } else { "folders" };
        Ok(Exit::error().with_message(format!(
            "Found {invalid} {word} without a Lean 4 project."
        )))
    }
}
