//! Shell completion generation
//!
//! Generates shell completion scripts for bash, zsh, fish, and PowerShell.
//!
//! # Usage
//!
//! ```bash
//! # Bash - add to ~/.bashrc
//! source <(qcd completions bash)
//!
//! # Zsh - add to ~/.zshrc
//! source <(qcd completions zsh)
//!
//! # Fish
//! qcd completions fish --output ~/.config/fish/completions/qcd.fish
//! ```

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let mut file = File::create(&path).into_diagnostic()?;
            generate(args.shell, &mut cmd, name, &mut file);
            eprintln!(
                "{} Wrote {} completions to {}",
                style("✓").green(),
                args.shell,
                style(path.display()).cyan()
            );
        }
        None => generate(args.shell, &mut cmd, name, &mut io::stdout()),
    }
    Ok(())
}
