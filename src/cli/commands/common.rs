//! Plumbing shared by every entity command: opening the workspace, the
//! generic list runner, delete confirmation and mutation replies

use std::fmt::Display;
use std::str::FromStr;

use chrono::Local;
use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::actions::{self, ActionError, ActionReply, ActionResult};
use crate::cli::notify::{fail, Reported};
use crate::cli::prompt::{self, TerminalConfirm};
use crate::cli::specs::ListSpec;
use crate::cli::table::{print_stat_cards, TableConfig, TableFormatter};
use crate::cli::{ConsoleNotifier, GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::{Config, Workspace};
use crate::entities::Evidence;
use crate::export::{self, list_file_name, ExportFormat, ReportDocument};
use crate::store::Store;
use crate::views::{report_failure, DeleteOutcome, FormError, ListView, Notifier, Submitted};

/// Flags every `list` subcommand accepts
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Limit number of rows shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only the number of matching rows
    #[arg(long)]
    pub count: bool,

    /// Skip the stat cards above the table
    #[arg(long)]
    pub no_stats: bool,

    /// Wrap long text columns at this width instead of truncating
    #[arg(long, value_name = "WIDTH")]
    pub wrap: Option<usize>,
}

/// `delete` flags
#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// ID or short ID
    pub id: String,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// `show` flags
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// ID or short ID
    pub id: String,
}

/// Find the workspace from `--workspace` or the current directory
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let found = match &global.workspace {
        Some(dir) => Workspace::discover_from(dir),
        None => Workspace::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

pub fn open_store(workspace: &Workspace) -> Result<Store> {
    Store::open(&workspace.db_path()).map_err(|e| miette::miette!("{}", e))
}

/// An open workspace with its store, config and output settings
pub struct Context {
    pub workspace: Workspace,
    pub store: Store,
    pub config: Config,
    pub notifier: ConsoleNotifier,
    pub format: OutputFormat,
}

impl Context {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = open_workspace(global)?;
        let store = open_store(&workspace)?;
        let config = Config::load(Some(&workspace));
        let format = effective_format(global.format, &config);
        Ok(Self {
            workspace,
            store,
            config,
            notifier: ConsoleNotifier::new(global.quiet || format.is_structured()),
            format,
        })
    }

    /// Report an action failure and return the marker error
    pub fn failed(&self, error: &ActionError) -> miette::Report {
        report_failure(&self.notifier, error);
        Reported.into()
    }

    /// Report a plain message as a failure
    pub fn fail(&self, message: &str) -> miette::Report {
        fail(&self.notifier, message)
    }

    /// Unwrap an action result, reporting a failure through the notifier
    pub fn check<T>(&self, result: ActionResult<T>) -> Result<T> {
        result.map_err(|e| self.failed(&e))
    }

    /// Resolve a reference to an existing record
    pub fn resolve<E: Entity>(&self, reference: &str) -> Result<EntityId> {
        self.check(actions::resolve::<E>(&self.store, reference))
    }

    pub fn resolve_opt<E: Entity>(&self, reference: Option<&str>) -> Result<Option<EntityId>> {
        self.check(actions::resolve_opt::<E>(&self.store, reference))
    }

    /// Resolve and fetch one record
    pub fn fetch<E: Entity>(&self, reference: &str) -> Result<E> {
        let id = self.resolve::<E>(reference)?;
        self.check(actions::fetch::<E>(&self.store, &id))
    }

    pub fn display_id(&self, id: &EntityId) -> String {
        self.store
            .display_id(id)
            .unwrap_or_else(|_| id.to_string())
    }

    /// Inspector reference preselected by the `default_inspector` setting
    pub fn default_inspector(&self) -> Option<String> {
        self.config.default_inspector.clone().filter(|r| !r.trim().is_empty())
    }
}

/// `--format auto` defers to `default_format` from the config
pub fn effective_format(requested: OutputFormat, config: &Config) -> OutputFormat {
    if requested != OutputFormat::Auto {
        return requested;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| match <OutputFormat as ValueEnum>::from_str(f, true) {
            Ok(format) => Some(format),
            Err(_) => {
                tracing::warn!(format = f, "ignoring unknown default_format");
                None
            }
        })
        .unwrap_or(OutputFormat::Auto)
}

/// Load, filter and print one collection.
///
/// Stat cards are computed over the rows that passed the search; `--limit`
/// only shortens the table.
pub fn run_list<S: ListSpec>(
    ctx: &Context,
    spec: &S,
    args: &ListArgs,
    fetch: impl FnOnce() -> ActionResult<Vec<S::Row>>,
) -> Result<()> {
    let mut view = ListView::new();
    ctx.check(view.reload(fetch))?;

    let search = args.search.as_deref().unwrap_or("");
    let rows: Vec<S::Row> = view
        .into_rows()
        .into_iter()
        .filter(|row| spec.matches(row, search))
        .collect();
    tracing::debug!(entity = S::NAME, rows = rows.len(), search, "filtered list");

    if args.count {
        println!("{}", rows.len());
        return Ok(());
    }

    let shown = &rows[..args.limit.map_or(rows.len(), |n| n.min(rows.len()))];

    match ctx.format {
        OutputFormat::Json => {
            let records: Vec<JsonValue> = shown.iter().map(|r| spec.record(r)).collect();
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let records: Vec<JsonValue> = shown.iter().map(|r| spec.record(r)).collect();
            print!("{}", serde_yml::to_string(&records).into_diagnostic()?);
        }
        format => {
            if !args.no_stats {
                print_stat_cards(&spec.stats(&rows), format);
            }
            let table_rows: Vec<_> = shown
                .iter()
                .map(|r| spec.row(r, ctx.display_id(spec.id(r))))
                .collect();
            let config = args.wrap.map(TableConfig::with_wrap).unwrap_or_default();
            TableFormatter::new(spec.columns(), S::NAME, S::PREFIX)
                .with_config(config)
                .output(&table_rows, format);
        }
    }
    Ok(())
}

/// Export the given rows as a document: stat cards become the metadata
/// lines and the list columns become the table
pub fn export_list<S: ListSpec>(
    ctx: &Context,
    spec: &S,
    title: &str,
    kind: &str,
    rows: &[S::Row],
    format: ExportFormat,
) -> Result<()> {
    let headers: Vec<&str> = spec.columns().iter().map(|c| c.header).collect();
    let mut doc = ReportDocument::new(title)
        .meta("Generated", Local::now().format("%Y-%m-%d %H:%M"))
        .meta("Prepared by", ctx.config.author());
    for card in spec.stats(rows) {
        doc = doc.meta(card.label, card.value);
    }
    let mut doc = doc.columns(&headers);
    for row in rows {
        let table_row = spec.row(row, ctx.display_id(spec.id(row)));
        doc.row(
            spec.columns()
                .iter()
                .map(|c| table_row.get(c.key).map(|v| v.raw()).unwrap_or_default())
                .collect(),
        );
    }
    write_document(ctx, &doc, &list_file_name(kind, Local::now(), format), format)
}

/// Write a document into the export directory and report where it went
pub fn write_document(
    ctx: &Context,
    doc: &ReportDocument,
    file_name: &str,
    format: ExportFormat,
) -> Result<()> {
    let dir = ctx.config.export_dir(&ctx.workspace);
    match export::write(doc, &dir, file_name, format) {
        Ok(path) => {
            ctx.notifier
                .success(&format!("Exported {} to {}", doc.title, path.display()));
            reply(ctx, ActionReply::ok("Exported", path.display().to_string()))
        }
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            Err(ctx.fail(&format!("Export failed: {}", e)))
        }
    }
}

/// Confirm, delete and report. A declined confirmation is not an error.
pub fn delete_with_confirm<R>(
    ctx: &Context,
    label: &str,
    yes: bool,
    delete: impl FnOnce() -> ActionResult<()>,
    fetch: impl FnOnce() -> ActionResult<Vec<R>>,
) -> Result<()> {
    let mut view = ListView::new();
    let mut confirm = TerminalConfirm::new(yes);
    match view.delete(label, &mut confirm, &ctx.notifier, delete, fetch) {
        DeleteOutcome::Deleted => {
            reply(ctx, ActionReply::ok(format!("Deleted {}", label), view.len()))
        }
        DeleteOutcome::Cancelled => reply(ctx, ActionReply::<()>::failed("Delete cancelled")),
        DeleteOutcome::Failed => {
            reply(ctx, ActionReply::<()>::failed(format!("Could not delete {}", label)))?;
            Err(Reported.into())
        }
    }
}

/// Print the mutation reply when structured output was requested
pub fn reply<T: Serialize>(ctx: &Context, reply: ActionReply<T>) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reply).into_diagnostic()?)
        }
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&reply).into_diagnostic()?),
        _ => {}
    }
    Ok(())
}

/// Turn a modal submit into a command result
pub fn saved<T: Serialize>(ctx: &Context, submitted: Submitted<T>, message: &str) -> Result<T> {
    match submitted {
        Submitted::Saved(value) => {
            reply(ctx, ActionReply::ok(message, &value))?;
            Ok(value)
        }
        Submitted::Invalid(e) => {
            reply(ctx, ActionReply::<()>::failed(e.to_string()))?;
            Err(Reported.into())
        }
        Submitted::Failed => {
            reply(ctx, ActionReply::<()>::failed("The action failed; nothing was saved"))?;
            Err(Reported.into())
        }
    }
}

/// Report a validation error raised outside a modal
pub fn invalid(ctx: &Context, error: FormError) -> miette::Report {
    ctx.fail(&error.to_string())
}

/// Print one record: YAML for people, JSON when asked
pub fn print_record<T: Serialize>(ctx: &Context, record: &T) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?)
        }
        _ => print!("{}", serde_yml::to_string(record).into_diagnostic()?),
    }
    Ok(())
}

/// Resolve a reference for a detail view; an unknown reference is `None`
/// rather than a failure
pub fn resolve_for_view<E: Entity>(ctx: &Context, reference: &str) -> Result<Option<EntityId>> {
    match actions::resolve::<E>(&ctx.store, reference) {
        Ok(id) => Ok(Some(id)),
        Err(ActionError::NotFound { .. }) => Ok(None),
        Err(e) => Err(ctx.failed(&e)),
    }
}

/// The not-found view of a detail page: what was missing and where to go
/// next. Not an error.
pub fn not_found_view(ctx: &Context, kind: &str, reference: &str, list_command: &str) -> Result<()> {
    if ctx.format.is_structured() {
        return reply(
            ctx,
            ActionReply::<()>::failed(format!("{} {} not found", kind, reference)),
        );
    }
    println!("{} {} not found", style("🔍").dim(), style(kind).bold());
    println!();
    println!(
        "No {} matches {}. It may have been deleted, or the ID is mistyped.",
        kind,
        style(reference).cyan()
    );
    println!();
    println!("  {} Back to the list", style(list_command).yellow());
    println!("  {} Back to the dashboard", style("qcd dashboard").yellow());
    Ok(())
}

/// A plain bordered table for detail views
pub fn detail_table(headers: &[&str], rows: Vec<Vec<String>>, markdown: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}

/// Evidence references of an ITP or NCR as a detail table
pub fn evidence_table(ctx: &Context, evidence: &[Evidence], markdown: bool) -> String {
    let rows = evidence
        .iter()
        .map(|e| {
            vec![
                ctx.display_id(&e.id),
                e.file_name.clone(),
                format_size(e.size_bytes),
                e.sha256.chars().take(12).collect(),
            ]
        })
        .collect();
    detail_table(&["ID", "File", "Size", "SHA-256"], rows, markdown)
}

pub fn format_size(bytes: i64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Resolve `--flag`, or in interactive mode pick from reference data
/// fetched as the form opens. An empty flag clears the selection.
pub fn pick<E: Entity>(
    ctx: &Context,
    target: &mut Option<EntityId>,
    flag: Option<String>,
    interactive: bool,
    label: &str,
) -> Result<()> {
    match flag {
        Some(reference) if reference.trim().is_empty() => *target = None,
        Some(reference) => *target = Some(ctx.resolve::<E>(&reference)?),
        None if interactive => {
            let choices = ctx.check(actions::options::<E>(&ctx.store))?;
            if choices.is_empty() {
                ctx.notifier.info(&format!("No {} records to choose from", E::NAME));
                return Ok(());
            }
            let current = target
                .as_ref()
                .and_then(|id| choices.iter().position(|(c, _)| c == id))
                .unwrap_or(0);
            let labels: Vec<&str> = choices.iter().map(|(_, l)| l.as_str()).collect();
            let index = prompt::choose(label, &labels, current)?;
            *target = choices.get(index).map(|(id, _)| id.clone());
        }
        None => {}
    }
    Ok(())
}

/// Take the flag value if given, then let the user revise it in
/// interactive mode
pub fn edit_text(target: &mut String, flag: Option<String>, interactive: bool, label: &str) -> Result<()> {
    if let Some(value) = flag {
        *target = value;
    }
    if interactive {
        *target = prompt::text(label, target, true)?;
    }
    Ok(())
}

/// [`edit_text`] for values parsed from text (numbers, dates)
pub fn edit_value<T>(target: &mut T, flag: Option<T>, interactive: bool, label: &str) -> Result<()>
where
    T: Clone + ToString + FromStr,
    <T as FromStr>::Err: ToString,
{
    if let Some(value) = flag {
        *target = value;
    }
    if interactive {
        *target = prompt::number(label, target.clone())?;
    }
    Ok(())
}

/// [`edit_text`] for a closed set of options
pub fn edit_choice<T>(target: &mut T, flag: Option<T>, interactive: bool, label: &str, options: &[T]) -> Result<()>
where
    T: Copy + PartialEq + Display,
{
    if let Some(value) = flag {
        *target = value;
    }
    if interactive && !options.is_empty() {
        let current = options.iter().position(|o| o == target).unwrap_or(0);
        *target = options[prompt::choose(label, options, current)?];
    }
    Ok(())
}

/// [`edit_text`] for yes/no fields
pub fn edit_flag(target: &mut bool, flag: Option<bool>, interactive: bool, label: &str) -> Result<()> {
    if let Some(value) = flag {
        *target = value;
    }
    if interactive {
        *target = prompt::ask(label, *target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_format_wins() {
        let config = Config {
            default_format: Some("json".to_string()),
            ..Config::default()
        };
        assert_eq!(effective_format(OutputFormat::Csv, &config), OutputFormat::Csv);
        assert_eq!(effective_format(OutputFormat::Auto, &config), OutputFormat::Json);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_detail_table_markdown() {
        let table = detail_table(&["A", "B"], vec![vec!["1".into(), "2".into()]], true);
        assert!(table.contains("| A | B |"));
        assert!(table.contains("| 1 | 2 |"));
    }

    #[test]
    fn test_unknown_default_format_falls_back() {
        let config = Config {
            default_format: Some("xml".to_string()),
            ..Config::default()
        };
        assert_eq!(effective_format(OutputFormat::Auto, &config), OutputFormat::Auto);
        assert_eq!(
            effective_format(OutputFormat::Auto, &Config::default()),
            OutputFormat::Auto
        );
    }
}
