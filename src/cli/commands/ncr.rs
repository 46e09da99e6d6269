//! `qcd ncr` command - Non-conformance reports

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::actions::qc::{
    attach_evidence, create_ncr, delete_ncr, get_ncr_detail, get_ncrs, set_ncr_status, update_ncr,
    EvidenceOwner, NcrDetail,
};
use crate::actions::{ActionError, ActionReply};
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, edit_text, evidence_table, not_found_view, pick, reply,
    resolve_for_view, run_list, saved, write_document, Context, DeleteArgs, ListArgs,
};
use crate::cli::helpers::or_dash;
use crate::cli::prompt;
use crate::cli::specs::{ncr_tone, NcrSpec};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::{Inspection, Inspector, Material, Ncr, NcrStatus, Project};
use crate::export::{record_file_name, ExportFormat, ReportDocument};
use crate::views::forms::{NcrForm, NcrFormSource};
use crate::views::{Modal, Notifier, Tone};

#[derive(Subcommand, Debug)]
pub enum NcrCommands {
    /// List NCRs with status, age and evidence counts
    List(ListArgs),

    /// Raise an NCR against an inspection, or record a failed inspection with it
    New(NewArgs),

    /// Edit an NCR
    Edit(EditArgs),

    /// Close an NCR
    Close(NcrRef),

    /// Reopen a closed NCR
    Reopen(NcrRef),

    /// Delete an NCR
    Delete(DeleteArgs),

    /// Show an NCR with its inspection and evidence
    Show(NcrRef),

    /// Attach evidence to an NCR
    Evidence(EvidenceArgs),

    /// Export one NCR as PDF or Markdown
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct NcrRef {
    /// NCR ID or short ID
    pub id: String,
}

#[derive(clap::Args, Debug, Default)]
pub struct NcrFields {
    /// NCR number (default: next NCR-<year>-NNNN)
    #[arg(long)]
    pub number: Option<String>,

    /// What does not conform
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Root cause
    #[arg(long)]
    pub root_cause: Option<String>,

    /// Corrective action
    #[arg(long)]
    pub corrective_action: Option<String>,

    /// Status (open, on_progress, closed)
    #[arg(long)]
    pub status: Option<NcrStatus>,

    /// Affected material (mark)
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Inspection that found the non-conformance
    #[arg(long, conflicts_with_all = ["project", "inspector"])]
    pub inspection: Option<String>,

    /// Project (records a new failed inspection together with the NCR)
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Inspector (records a new failed inspection together with the NCR)
    #[arg(long)]
    pub inspector: Option<String>,

    #[command(flatten)]
    pub fields: NcrFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// NCR ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: NcrFields,
}

#[derive(clap::Args, Debug)]
pub struct EvidenceArgs {
    /// NCR ID or short ID
    pub id: String,

    /// File or directory to reference
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// NCR ID or short ID
    pub id: String,

    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    pub to: ExportFormat,
}

pub fn run(cmd: NcrCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        NcrCommands::List(args) => run_list(&ctx, &NcrSpec, &args, || get_ncrs(&ctx.store)),
        NcrCommands::New(args) => run_new(&ctx, args),
        NcrCommands::Edit(args) => run_edit(&ctx, args),
        NcrCommands::Close(args) => run_status(&ctx, &args.id, NcrStatus::Closed),
        NcrCommands::Reopen(args) => run_status(&ctx, &args.id, NcrStatus::Open),
        NcrCommands::Delete(args) => {
            let ncr: Ncr = ctx.fetch(&args.id)?;
            delete_with_confirm(
                &ctx,
                &format!("NCR {}", ncr.ncr_number),
                args.yes,
                || delete_ncr(&ctx.store, &ncr.id),
                || get_ncrs(&ctx.store),
            )
        }
        NcrCommands::Show(args) => run_show(&ctx, &args.id),
        NcrCommands::Evidence(args) => {
            let id = ctx.resolve::<Ncr>(&args.id)?;
            let path = ctx.workspace.resolve(&args.path);
            let created = ctx.check(attach_evidence(&ctx.store, EvidenceOwner::Ncr(id), &path))?;
            for e in &created {
                ctx.notifier
                    .success(&format!("Attached {} {}", e.short_id, e.record.file_name));
            }
            reply(&ctx, ActionReply::ok("Evidence attached", created))
        }
        NcrCommands::Export(args) => run_export(&ctx, args),
    }
}

fn fill(ctx: &Context, form: &mut NcrForm, fields: NcrFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.ncr_number, fields.number, i, "NCR number (blank for next)")?;
    edit_text(&mut form.description, fields.description, i, "Description")?;
    edit_text(&mut form.root_cause, fields.root_cause, i, "Root cause")?;
    edit_text(&mut form.corrective_action, fields.corrective_action, i, "Corrective action")?;
    pick::<Material>(ctx, &mut form.material, fields.material, i, "Material")?;
    edit_choice(&mut form.status, fields.status, i, "Status", NcrStatus::all())
}

/// Decide where the NCR's inspection comes from
fn fill_source(ctx: &Context, form: &mut NcrForm, args: &NewArgs) -> Result<()> {
    let i = args.fields.interactive;
    let manual = args.project.is_some()
        || args.inspector.is_some()
        || (i && args.inspection.is_none()
            && prompt::ask("Record a new failed inspection for this NCR?", false)?);

    form.source = if manual {
        let mut project = None;
        let mut inspector = None;
        pick::<Project>(ctx, &mut project, args.project.clone(), i, "Project")?;
        let inspector_ref = args.inspector.clone().or_else(|| ctx.default_inspector());
        pick::<Inspector>(ctx, &mut inspector, inspector_ref, i, "Inspector")?;
        NcrFormSource::Manual { project, inspector }
    } else {
        let mut inspection = None;
        pick::<Inspection>(ctx, &mut inspection, args.inspection.clone(), i, "Inspection")?;
        NcrFormSource::Existing(inspection)
    };
    Ok(())
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<NcrForm>::create();
    fill_source(ctx, modal.form_mut(), &args)?;
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let request = form
                .request()
                .map_err(|e| ActionError::rejected(e.to_string()))?;
            create_ncr(&ctx.store, request)
        },
        |ncr| format!("Raised {} ({})", ncr.record.ncr_number, ncr.short_id),
    );
    saved(ctx, submitted, "NCR created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let ncr: Ncr = ctx.fetch(&args.id)?;
    let mut modal = Modal::<NcrForm>::editing(&ncr);
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = ncr.clone();
            form.apply(&mut updated);
            update_ncr(&ctx.store, &mut updated).map(|_| updated)
        },
        |ncr| format!("Updated {}", ncr.ncr_number),
    );
    saved(ctx, submitted, "NCR updated")?;
    Ok(())
}

fn run_status(ctx: &Context, reference: &str, status: NcrStatus) -> Result<()> {
    let id = ctx.resolve::<Ncr>(reference)?;
    let ncr = ctx.check(set_ncr_status(&ctx.store, &id, status))?;
    ctx.notifier
        .success(&format!("{} is now {}", ncr.ncr_number, ncr.status));
    reply(ctx, ActionReply::ok("NCR status changed", &ncr))
}

fn load_detail(ctx: &Context, reference: &str) -> Result<Option<NcrDetail>> {
    match resolve_for_view::<Ncr>(ctx, reference)? {
        Some(id) => ctx.check(get_ncr_detail(&ctx.store, &id)),
        None => Ok(None),
    }
}

fn local_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn run_show(ctx: &Context, reference: &str) -> Result<()> {
    let Some(detail) = load_detail(ctx, reference)? else {
        return not_found_view(ctx, "NCR", reference, "qcd ncr list");
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

    let ncr = &detail.summary.ncr;
    let status = match ncr_tone(ncr.status) {
        Tone::Bad => style(ncr.status.to_string()).red(),
        Tone::Warn => style(ncr.status.to_string()).yellow(),
        _ => style(ncr.status.to_string()).green(),
    };
    println!(
        "{} {} [{}]",
        style(ctx.display_id(&ncr.id)).cyan(),
        style(&ncr.ncr_number).bold(),
        status
    );
    let field = |label: &str, value: &str| {
        println!("{:<18} {}", style(label).dim(), if value.is_empty() { "-" } else { value });
    };
    field("Project", detail.summary.project_name.as_deref().unwrap_or(""));
    field("Inspector", detail.summary.inspector_name.as_deref().unwrap_or(""));
    field("Material", detail.summary.material_mark.as_deref().unwrap_or(""));
    if let Some(inspection) = &detail.inspection {
        field(
            "Inspection",
            &format!(
                "{} on {} ({})",
                ctx.display_id(&inspection.id),
                inspection.inspected_on,
                inspection.result
            ),
        );
    }
    field("Raised", &local_date(ncr.created));
    field("Age (days)", &ncr.age_days().to_string());
    if let Some(closed) = ncr.closed_at {
        field("Closed", &local_date(closed));
    }
    println!();
    field("Description", &ncr.description);
    field("Root cause", &ncr.root_cause);
    field("Corrective action", &ncr.corrective_action);
    println!();

    println!("{} ({})", style("Evidence").bold(), detail.evidence.len());
    if detail.evidence.is_empty() {
        println!("  {}", style("No evidence attached.").dim());
    } else {
        println!(
            "{}",
            evidence_table(ctx, &detail.evidence, ctx.format == OutputFormat::Md)
        );
    }
    Ok(())
}

fn run_export(ctx: &Context, args: ExportArgs) -> Result<()> {
    let Some(detail) = load_detail(ctx, &args.id)? else {
        return Err(ctx.fail(&format!("NCR {} not found", args.id)));
    };
    let ncr = &detail.summary.ncr;

    let mut doc = ReportDocument::new(format!("Non-Conformance Report {}", ncr.ncr_number))
        .meta("Status", ncr.status)
        .meta("Project", or_dash(detail.summary.project_name.as_deref()))
        .meta("Inspector", or_dash(detail.summary.inspector_name.as_deref()))
        .meta("Material", or_dash(detail.summary.material_mark.as_deref()))
        .meta("Raised", local_date(ncr.created))
        .meta(
            "Closed",
            ncr.closed_at.map(local_date).unwrap_or_else(|| "-".to_string()),
        )
        .meta("Description", or_dash(Some(&ncr.description)))
        .meta("Root cause", or_dash(Some(&ncr.root_cause)))
        .meta("Corrective action", or_dash(Some(&ncr.corrective_action)))
        .meta("Prepared by", ctx.config.author())
        .meta("Generated", Local::now().format("%Y-%m-%d %H:%M"))
        .columns(&["Evidence file", "Size (bytes)", "SHA-256"]);
    for e in &detail.evidence {
        doc.row(vec![e.file_name.clone(), e.size_bytes.to_string(), e.sha256.clone()]);
    }

    write_document(
        ctx,
        &doc,
        &record_file_name("NCR", &ncr.ncr_number, args.to),
        args.to,
    )
}
