//! CLI module - argument parsing, rendering and command dispatch

pub mod args;
pub mod commands;
pub mod helpers;
pub mod notify;
pub mod prompt;
pub mod specs;
pub mod table;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use notify::{ConsoleNotifier, Reported};
