//! `qcd itp` command - Inspection test plans, their stage items and evidence

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::actions::qc::{
    add_itp_item, attach_evidence, create_itp, delete_evidence, delete_itp, delete_itp_item,
    get_itp_detail, get_itps, update_itp, update_itp_item, EvidenceOwner, ItpDetail,
};
use crate::actions::{ActionReply, ActionResult};
use crate::cli::commands::common::{
    delete_with_confirm, detail_table, edit_choice, edit_flag, edit_text, evidence_table,
    not_found_view, pick, reply, resolve_for_view, run_list, saved, write_document, Context,
    DeleteArgs, ListArgs,
};
use crate::cli::specs::ItpSpec;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::entities::{Approval, Evidence, Itp, ItpItem, ItpStatus, Project};
use crate::export::{record_file_name, ExportFormat, ReportDocument};
use crate::views::forms::{ItpForm, ItpItemForm};
use crate::views::{Modal, Notifier};

#[derive(Subcommand, Debug)]
pub enum ItpCommands {
    /// List ITPs with item, hold point and evidence counts
    List(ListArgs),

    /// Create an ITP
    New(NewArgs),

    /// Edit an ITP
    Edit(EditArgs),

    /// Delete an ITP with its items and evidence references
    Delete(DeleteArgs),

    /// Show an ITP with its stage items and evidence
    Show(ItpRef),

    /// Manage stage items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Manage evidence references
    #[command(subcommand)]
    Evidence(EvidenceCommands),

    /// Export one ITP as PDF or Markdown
    Export(ExportArgs),
}

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Append a stage item to an ITP
    Add(ItemAddArgs),

    /// Edit a stage item
    Edit(ItemEditArgs),

    /// Delete a stage item
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Attach a file, or every file below a directory
    Add(EvidenceAddArgs),

    /// Remove an evidence reference (the file itself is kept)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ItpRef {
    /// ITP ID or short ID
    pub id: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct ItpFields {
    /// ITP title
    #[arg(long)]
    pub title: Option<String>,

    /// Status (draft, issued, approved)
    #[arg(long)]
    pub status: Option<ItpStatus>,

    /// Project the ITP covers
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: ItpFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// ITP ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: ItpFields,
}

#[derive(clap::Args, Debug, Default)]
pub struct ItemFields {
    /// Stage name (e.g. "Fit-up")
    #[arg(long)]
    pub stage: Option<String>,

    /// What is inspected and against which criteria
    #[arg(long)]
    pub description: Option<String>,

    /// Hold point
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub hold: Option<bool>,

    /// Witness point
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub witness: Option<bool>,

    /// Surveillance
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub surveillance: Option<bool>,

    /// Approval (pending, pass, reject)
    #[arg(long)]
    pub approval: Option<Approval>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ItemAddArgs {
    /// ITP ID or short ID
    pub itp: String,

    #[command(flatten)]
    pub fields: ItemFields,
}

#[derive(clap::Args, Debug)]
pub struct ItemEditArgs {
    /// Item ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: ItemFields,
}

#[derive(clap::Args, Debug)]
pub struct EvidenceAddArgs {
    /// ITP ID or short ID
    pub itp: String,

    /// File or directory to reference
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// ITP ID or short ID
    pub id: String,

    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    pub to: ExportFormat,
}

pub fn run(cmd: ItpCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        ItpCommands::List(args) => run_list(&ctx, &ItpSpec, &args, || get_itps(&ctx.store)),
        ItpCommands::New(args) => run_new(&ctx, args),
        ItpCommands::Edit(args) => run_edit(&ctx, args),
        ItpCommands::Delete(args) => {
            let itp: Itp = ctx.fetch(&args.id)?;
            delete_with_confirm(
                &ctx,
                &format!("ITP \"{}\" with its items", itp.title),
                args.yes,
                || delete_itp(&ctx.store, &itp.id),
                || get_itps(&ctx.store),
            )
        }
        ItpCommands::Show(args) => run_show(&ctx, &args.id),
        ItpCommands::Item(cmd) => run_item(&ctx, cmd),
        ItpCommands::Evidence(cmd) => run_evidence(&ctx, cmd),
        ItpCommands::Export(args) => run_export(&ctx, args),
    }
}

fn fill(ctx: &Context, form: &mut ItpForm, fields: ItpFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.title, fields.title, i, "Title")?;
    pick::<Project>(ctx, &mut form.project, fields.project, i, "Project")?;
    edit_choice(&mut form.status, fields.status, i, "Status", ItpStatus::all())
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<ItpForm>::create();
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_itp(&ctx.store, form.build()),
        |itp| format!("Created ITP {} {}", itp.short_id, itp.record.title),
    );
    saved(ctx, submitted, "ITP created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let itp: Itp = ctx.fetch(&args.id)?;
    let mut modal = Modal::<ItpForm>::editing(&itp);
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = itp.clone();
            form.apply(&mut updated);
            update_itp(&ctx.store, &updated).map(|_| updated)
        },
        |itp| format!("Updated ITP {}", itp.title),
    );
    saved(ctx, submitted, "ITP updated")?;
    Ok(())
}

/// Load a detail, or `None` when the reference matches nothing
fn load_detail(ctx: &Context, reference: &str) -> Result<Option<ItpDetail>> {
    match resolve_for_view::<Itp>(ctx, reference)? {
        Some(id) => ctx.check(get_itp_detail(&ctx.store, &id)),
        None => Ok(None),
    }
}

fn run_show(ctx: &Context, reference: &str) -> Result<()> {
    let Some(detail) = load_detail(ctx, reference)? else {
        return not_found_view(ctx, "ITP", reference, "qcd itp list");
    };

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&detail).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&detail).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    let markdown = ctx.format == OutputFormat::Md;
    let itp = &detail.itp;
    println!(
        "{} {}",
        style(ctx.display_id(&itp.id)).cyan(),
        style(&itp.title).bold()
    );
    println!(
        "Project: {}",
        detail.project_name.as_deref().unwrap_or("-")
    );
    println!("Status:  {}", itp.status);
    println!("Created: {}", itp.created.with_timezone(&Local).format("%Y-%m-%d"));
    println!();

    println!("{} ({})", style("Stage items").bold(), detail.items.len());
    if detail.items.is_empty() {
        println!("  {}", style("No items yet. Add one with `qcd itp item add`.").dim());
    } else {
        println!("{}", detail_table(&ITEM_HEADERS, item_rows(ctx, &detail.items), markdown));
    }
    println!();

    println!("{} ({})", style("Evidence").bold(), detail.evidence.len());
    if detail.evidence.is_empty() {
        println!("  {}", style("No evidence attached.").dim());
    } else {
        println!("{}", evidence_table(ctx, &detail.evidence, markdown));
    }
    Ok(())
}

const ITEM_HEADERS: [&str; 6] = ["ID", "#", "Stage", "Description", "H W S", "Approval"];

fn item_rows(ctx: &Context, items: &[ItpItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            vec![
                ctx.display_id(&item.id),
                item.seq.to_string(),
                item.stage.clone(),
                item.description.clone(),
                item.designation(),
                item.approval.to_string(),
            ]
        })
        .collect()
}

fn items_of(ctx: &Context, itp_id: &EntityId) -> ActionResult<Vec<ItpItem>> {
    Ok(get_itp_detail(&ctx.store, itp_id)?
        .map(|d| d.items)
        .unwrap_or_default())
}

fn fill_item(form: &mut ItpItemForm, fields: ItemFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.stage, fields.stage, i, "Stage")?;
    edit_text(&mut form.description, fields.description, i, "Description")?;
    edit_flag(&mut form.hold_point, fields.hold, i, "Hold point?")?;
    edit_flag(&mut form.witness_point, fields.witness, i, "Witness point?")?;
    edit_flag(&mut form.surveillance, fields.surveillance, i, "Surveillance?")?;
    edit_choice(
        &mut form.approval,
        fields.approval,
        i,
        "Approval",
        &[Approval::Pending, Approval::Pass, Approval::Reject],
    )
}

fn run_item(ctx: &Context, cmd: ItemCommands) -> Result<()> {
    match cmd {
        ItemCommands::Add(args) => {
            let itp_id = ctx.resolve::<Itp>(&args.itp)?;
            let mut modal = Modal::<ItpItemForm>::create();
            modal.form_mut().itp = Some(itp_id);
            fill_item(modal.form_mut(), args.fields)?;

            let submitted = modal.submit(
                &ctx.notifier,
                |form| match form.build() {
                    Some(item) => add_itp_item(&ctx.store, item),
                    None => Err(crate::actions::ActionError::rejected(
                        "Please select an ITP first",
                    )),
                },
                |item| format!("Added stage {} \"{}\"", item.record.seq, item.record.stage),
            );
            saved(ctx, submitted, "ITP item added")?;
            Ok(())
        }
        ItemCommands::Edit(args) => {
            let item: ItpItem = ctx.fetch(&args.id)?;
            let mut modal = Modal::<ItpItemForm>::editing(&item);
            fill_item(modal.form_mut(), args.fields)?;

            let submitted = modal.submit(
                &ctx.notifier,
                |form| {
                    let mut updated = item.clone();
                    form.apply(&mut updated);
                    update_itp_item(&ctx.store, &updated).map(|_| updated)
                },
                |item| format!("Updated stage {} \"{}\"", item.seq, item.stage),
            );
            saved(ctx, submitted, "ITP item updated")?;
            Ok(())
        }
        ItemCommands::Delete(args) => {
            let item: ItpItem = ctx.fetch(&args.id)?;
            delete_with_confirm(
                ctx,
                &format!("stage \"{}\"", item.stage),
                args.yes,
                || delete_itp_item(&ctx.store, &item.id),
                || items_of(ctx, &item.itp_id),
            )
        }
    }
}

fn run_evidence(ctx: &Context, cmd: EvidenceCommands) -> Result<()> {
    match cmd {
        EvidenceCommands::Add(args) => {
            let itp_id = ctx.resolve::<Itp>(&args.itp)?;
            let path = ctx.workspace.resolve(&args.path);
            let created = ctx.check(attach_evidence(
                &ctx.store,
                EvidenceOwner::Itp(itp_id),
                &path,
            ))?;
            for e in &created {
                ctx.notifier
                    .success(&format!("Attached {} {}", e.short_id, e.record.file_name));
            }
            reply(ctx, ActionReply::ok("Evidence attached", created))
        }
        EvidenceCommands::Delete(args) => {
            let evidence: Evidence = ctx.fetch(&args.id)?;
            delete_with_confirm(
                ctx,
                &format!("evidence {}", evidence.file_name),
                args.yes,
                || delete_evidence(&ctx.store, &evidence.id),
                || evidence_of(ctx, &evidence),
            )
        }
    }
}

/// Evidence still attached to the owner of `removed`
fn evidence_of(ctx: &Context, removed: &Evidence) -> ActionResult<Vec<Evidence>> {
    let Some(itp_id) = &removed.itp_id else {
        return Ok(Vec::new());
    };
    Ok(get_itp_detail(&ctx.store, itp_id)?
        .map(|d| d.evidence)
        .unwrap_or_default())
}

fn run_export(ctx: &Context, args: ExportArgs) -> Result<()> {
    let Some(detail) = load_detail(ctx, &args.id)? else {
        return Err(ctx.fail(&format!("ITP {} not found", args.id)));
    };
    let doc = itp_document(ctx, &detail);
    write_document(
        ctx,
        &doc,
        &record_file_name("ITP", &detail.itp.title, args.to),
        args.to,
    )
}

fn itp_document(ctx: &Context, detail: &ItpDetail) -> ReportDocument {
    let itp = &detail.itp;
    let holds = detail.items.iter().filter(|i| i.hold_point).count();
    let mut doc = ReportDocument::new(format!("Inspection Test Plan: {}", itp.title))
        .meta("ITP", ctx.display_id(&itp.id))
        .meta("Project", detail.project_name.as_deref().unwrap_or("-"))
        .meta("Status", itp.status)
        .meta("Stage items", detail.items.len())
        .meta("Hold points", holds)
        .meta("Evidence files", detail.evidence.len())
        .meta("Prepared by", ctx.config.author())
        .meta("Generated", Local::now().format("%Y-%m-%d %H:%M"))
        .columns(&["#", "Stage", "Description", "Hold", "Witness", "Surveillance", "Approval"]);
    let mark = |on: bool| if on { "X".to_string() } else { String::new() };
    for item in &detail.items {
        doc.row(vec![
            item.seq.to_string(),
            item.stage.clone(),
            item.description.clone(),
            mark(item.hold_point),
            mark(item.witness_point),
            mark(item.surveillance),
            item.approval.to_string(),
        ]);
    }
    doc
}
