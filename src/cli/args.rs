//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    client::ClientCommands, completions::CompletionsArgs, dashboard::DashboardArgs,
    drawing::DrawingCommands, init::InitArgs, inspection::InspectionCommands,
    inspector::InspectorCommands, itp::ItpCommands, material::MaterialCommands, mdr::MdrArgs,
    ncr::NcrCommands, project::ProjectCommands, validate::ValidateArgs, welder::WelderCommands,
    wps::WpsCommands,
};

#[derive(Parser)]
#[command(name = "qcd")]
#[command(author, version, about = "QC Dashboard - fabrication quality records")]
#[command(
    long_about = "Manage inspection test plans, non-conformance reports, manufacturing data records and the master data behind them in a local workspace."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose diagnostics on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .qcd/)
    #[arg(long, short = 'w', global = true, env = "QCD_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new QCD workspace
    Init(InitArgs),

    /// Show key figures across every collection
    Dashboard(DashboardArgs),

    /// Client management
    #[command(subcommand)]
    Client(ClientCommands),

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Material (mark list) management, import and export
    #[command(subcommand)]
    Material(MaterialCommands),

    /// Welder management with repair-rate standing
    #[command(subcommand)]
    Welder(WelderCommands),

    /// QC inspector management
    #[command(subcommand)]
    Inspector(InspectorCommands),

    /// Welding procedure specifications
    #[command(subcommand)]
    Wps(WpsCommands),

    /// Controlled drawings
    #[command(subcommand)]
    Drawing(DrawingCommands),

    /// Inspection test plans, stage items and evidence
    #[command(subcommand)]
    Itp(ItpCommands),

    /// Non-conformance reports
    #[command(subcommand)]
    Ncr(NcrCommands),

    /// Inspection records
    #[command(subcommand)]
    Inspection(InspectionCommands),

    /// Manufacturing data reports by discipline
    Mdr(MdrArgs),

    /// Check stored MDR payloads against their schemas
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, detail view for show
    #[default]
    Auto,
    /// Aligned columns
    Tsv,
    /// CSV (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// JSON (for programming)
    Json,
    /// YAML (full fidelity)
    Yaml,
    /// Just full IDs, one per line
    Id,
    /// Just short IDs, one per line
    ShortId,
}

impl OutputFormat {
    /// Structured formats print data instead of tables and notifications
    pub fn is_structured(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}
