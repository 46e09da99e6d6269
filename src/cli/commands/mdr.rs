//! `qcd mdr <discipline>` command - Manufacturing data reports
//!
//! Every discipline shares one set of subcommands; the payload fields differ
//! and are set with `--set key=value` or prompted one by one.

use clap::Subcommand;
use miette::Result;
use serde_json::Value as JsonValue;

use crate::actions::master::get_welders;
use crate::actions::mdr::{create_report, delete_report, get_report_detail, get_reports, update_report};
use crate::actions::ActionResult;
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, export_list, pick, print_record, run_list, saved, Context,
    DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::helpers::parse_assignments;
use crate::cli::prompt;
use crate::cli::specs::{welder_names, ListSpec, MdrSpec};
use crate::cli::GlobalOpts;
use crate::core::identity::EntityId;
use crate::entities::{
    Discipline, FieldError, Inspector, MdrPayload, MdrReport, MdrSummary, Project, ReportStatus,
    Welder,
};
use crate::export::ExportFormat;
use crate::views::forms::MdrForm;
use crate::views::{FormError, Modal, Notifier};

#[derive(clap::Args, Debug)]
pub struct MdrArgs {
    /// Discipline (cutting, fitup, ndt, painting, welding, incoming, final)
    pub discipline: Discipline,

    #[command(subcommand)]
    pub command: MdrCommands,
}

#[derive(Subcommand, Debug)]
pub enum MdrCommands {
    /// List reports of the discipline with its stat cards
    List(MdrListArgs),

    /// Record a report
    New(NewArgs),

    /// Edit a report
    Edit(EditArgs),

    /// Delete a report
    Delete(DeleteArgs),

    /// Show a report
    Show(ShowArgs),

    /// Export the discipline's reports as PDF or Markdown
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct MdrListArgs {
    #[command(flatten)]
    pub list: ListArgs,

    /// Only reports of this project
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

#[derive(clap::Args, Debug, Default)]
pub struct ReportFields {
    /// Project
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Inspector (default: `default_inspector` from config)
    #[arg(long)]
    pub inspector: Option<String>,

    /// Status; the allowed values depend on the discipline
    #[arg(long)]
    pub status: Option<ReportStatus>,

    /// Payload field, e.g. --set joint_no=J-14 --set gap=3.5
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: ReportFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Report ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: ReportFields,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    pub to: ExportFormat,

    /// Case-insensitive free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only reports of this project
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

pub fn run(args: MdrArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let discipline = args.discipline;
    match args.command {
        MdrCommands::List(list) => {
            let spec = spec_for(&ctx, discipline)?;
            let project = ctx.resolve_opt::<Project>(list.project.as_deref())?;
            run_list(&ctx, &spec, &list.list, || {
                reports_of(&ctx, discipline, project.as_ref())
            })
        }
        MdrCommands::New(new) => run_new(&ctx, discipline, new.fields),
        MdrCommands::Edit(edit) => run_edit(&ctx, discipline, edit),
        MdrCommands::Delete(del) => {
            let report = fetch_report(&ctx, discipline, &del.id)?;
            delete_with_confirm(
                &ctx,
                &format!("{} report {}", discipline.label(), ctx.display_id(&report.id)),
                del.yes,
                || delete_report(&ctx.store, &report.id),
                || get_reports(&ctx.store, Some(discipline)),
            )
        }
        MdrCommands::Show(show) => {
            let report = fetch_report(&ctx, discipline, &show.id)?;
            match ctx.check(get_report_detail(&ctx.store, &report.id))? {
                Some(summary) => print_record(&ctx, &summary),
                None => Err(ctx.fail(&format!("Report {} not found", show.id))),
            }
        }
        MdrCommands::Export(export) => {
            let spec = spec_for(&ctx, discipline)?;
            let project = ctx.resolve_opt::<Project>(export.project.as_deref())?;
            let search = export.search.as_deref().unwrap_or("");
            let rows: Vec<MdrSummary> = ctx
                .check(reports_of(&ctx, discipline, project.as_ref()))?
                .into_iter()
                .filter(|r| spec.matches(r, search))
                .collect();
            export_list(
                &ctx,
                &spec,
                &format!("{} Report", discipline.label()),
                &format!("MDR_{}", discipline.as_str()),
                &rows,
                export.to,
            )
        }
    }
}

/// List configuration with welder names and the configured repair threshold
fn spec_for(ctx: &Context, discipline: Discipline) -> Result<MdrSpec> {
    let mut spec = MdrSpec::new(discipline);
    spec.repair_threshold = ctx.config.repair_rate_threshold();
    if discipline == Discipline::Welding {
        spec.welder_names = welder_names(&ctx.check(get_welders(&ctx.store))?);
    }
    Ok(spec)
}

fn reports_of(
    ctx: &Context,
    discipline: Discipline,
    project: Option<&EntityId>,
) -> ActionResult<Vec<MdrSummary>> {
    let reports = get_reports(&ctx.store, Some(discipline))?;
    Ok(match project {
        Some(id) => reports
            .into_iter()
            .filter(|r| &r.report.project_id == id)
            .collect(),
        None => reports,
    })
}

/// Fetch a report and make sure it belongs to `discipline`
fn fetch_report(ctx: &Context, discipline: Discipline, reference: &str) -> Result<MdrReport> {
    let report: MdrReport = ctx.fetch(reference)?;
    if report.discipline != discipline {
        return Err(ctx.fail(&format!(
            "{} is a {} report; use `qcd mdr {} ...`",
            reference,
            report.discipline.label(),
            report.discipline.as_str().to_lowercase()
        )));
    }
    Ok(report)
}

/// Text of one payload field as the user would type it
fn field_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Apply `--set` pairs. Welder references are resolved to full IDs so a
/// short ID or ID prefix can be given.
fn apply_assignments(ctx: &Context, payload: &mut MdrPayload, pairs: &[String]) -> Result<()> {
    let pairs = parse_assignments(pairs).map_err(|e| ctx.fail(&e))?;
    for (key, value) in pairs {
        let value = if key == "welder_id" && !value.is_empty() {
            ctx.resolve::<Welder>(&value)?.to_string()
        } else {
            value
        };
        set_field(ctx, payload, &key, &value)?;
    }
    Ok(())
}

/// Set one payload field, reporting unknown keys and unparseable values
fn set_field(ctx: &Context, payload: &mut MdrPayload, key: &str, value: &str) -> Result<()> {
    let message = match payload.set_field(key, value) {
        Ok(()) => return Ok(()),
        Err(FieldError::Unknown(_)) => format!(
            "Unknown {} field '{}'. Fields: {}",
            payload.discipline().label(),
            key,
            payload.field_names().join(", ")
        ),
        Err(invalid) => {
            FormError::Invalid(format!("{} field {}", payload.discipline().label(), invalid))
                .to_string()
        }
    };
    Err(ctx.fail(&message))
}

fn prompt_payload(ctx: &Context, payload: &mut MdrPayload) -> Result<()> {
    let current = serde_json::to_value(&*payload).unwrap_or(JsonValue::Null);
    for name in payload.field_names() {
        let initial = current.get(&name).map(field_text).unwrap_or_default();
        if name == "welder_id" {
            let mut welder = EntityId::parse(&initial).ok();
            pick::<Welder>(ctx, &mut welder, None, true, "Welder")?;
            let id = welder.map(|w| w.to_string()).unwrap_or_default();
            set_field(ctx, payload, &name, &id)?;
            continue;
        }
        // Ask again until the value parses
        let mut value = prompt::text(&name, &initial, true)?;
        while let Err(e) = payload.set_field(&name, &value) {
            ctx.notifier.error(&e.to_string());
            value = prompt::text(&name, &initial, true)?;
        }
    }
    Ok(())
}

fn fill(ctx: &Context, form: &mut MdrForm, fields: &ReportFields) -> Result<()> {
    let i = fields.interactive;
    pick::<Project>(ctx, &mut form.project, fields.project.clone(), i, "Project")?;
    let inspector = fields
        .inspector
        .clone()
        .or_else(|| form.inspector.is_none().then(|| ctx.default_inspector()).flatten());
    pick::<Inspector>(ctx, &mut form.inspector, inspector, i, "Inspector")?;
    let statuses = form.discipline().statuses();
    edit_choice(&mut form.status, fields.status, i, "Status", statuses)?;
    apply_assignments(ctx, &mut form.payload, &fields.set)?;
    if i {
        prompt_payload(ctx, &mut form.payload)?;
    }
    Ok(())
}

fn run_new(ctx: &Context, discipline: Discipline, fields: ReportFields) -> Result<()> {
    let mut modal = Modal::<MdrForm>::create();
    *modal.form_mut() = MdrForm::new(discipline);

    // Interactive entry loops; project and inspector carry over between reports
    let mut fields = fields;
    loop {
        fill(ctx, modal.form_mut(), &fields)?;
        let submitted = modal.submit(
            &ctx.notifier,
            |form| match form.build() {
                Some(report) => create_report(&ctx.store, report),
                None => Err(crate::actions::ActionError::rejected(
                    "Please select a project and inspector first",
                )),
            },
            |r| format!("Recorded {} report {}", discipline.label(), r.short_id),
        );
        saved(ctx, submitted, "Report created")?;

        if !fields.interactive || !prompt::ask("Record another report?", false)? {
            return Ok(());
        }
        // Flags apply to the first report only
        fields = ReportFields {
            interactive: true,
            ..ReportFields::default()
        };
    }
}

fn run_edit(ctx: &Context, discipline: Discipline, args: EditArgs) -> Result<()> {
    let report = fetch_report(ctx, discipline, &args.id)?;
    let mut modal = Modal::<MdrForm>::editing(&report);
    fill(ctx, modal.form_mut(), &args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = report.clone();
            form.apply(&mut updated);
            update_report(&ctx.store, &updated).map(|_| updated)
        },
        |r| format!("Updated {} report {}", discipline.label(), ctx.display_id(&r.id)),
    );
    saved(ctx, submitted, "Report updated")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::Form;

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(&JsonValue::String("J-1".into())), "J-1");
        assert_eq!(field_text(&serde_json::json!(3.5)), "3.5");
        assert_eq!(field_text(&serde_json::json!(true)), "true");
        assert_eq!(field_text(&JsonValue::Null), "");
    }

    #[test]
    fn test_blank_form_is_cutting() {
        assert_eq!(MdrForm::blank().discipline(), Discipline::Cutting);
    }
}
