//! `qcd inspection` command - Inspection records

use chrono::NaiveDate;
use clap::Subcommand;
use miette::Result;

use crate::actions::qc::{create_inspection, delete_inspection, get_inspections};
use crate::actions::ActionError;
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, edit_text, edit_value, pick, print_record, run_list, saved,
    Context, DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::specs::InspectionSpec;
use crate::cli::GlobalOpts;
use crate::entities::{Inspection, InspectionResult, Inspector, Material, Project};
use crate::views::forms::InspectionForm;
use crate::views::Modal;

#[derive(Subcommand, Debug)]
pub enum InspectionCommands {
    /// List inspections with their NCR counts
    List(ListArgs),

    /// Record an inspection
    New(NewArgs),

    /// Delete an inspection and the NCRs raised against it
    Delete(DeleteArgs),

    /// Show an inspection
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Project inspected
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Inspector (default: `default_inspector` from config)
    #[arg(long)]
    pub inspector: Option<String>,

    /// Material inspected
    #[arg(long, short = 'm')]
    pub material: Option<String>,

    /// Result (pending, pass, fail)
    #[arg(long)]
    pub result: Option<InspectionResult>,

    /// Inspection date, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

pub fn run(cmd: InspectionCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        InspectionCommands::List(args) => {
            run_list(&ctx, &InspectionSpec, &args, || get_inspections(&ctx.store))
        }
        InspectionCommands::New(args) => run_new(&ctx, args),
        InspectionCommands::Delete(args) => {
            let inspection: Inspection = ctx.fetch(&args.id)?;
            delete_with_confirm(
                &ctx,
                &format!(
                    "inspection of {} with its NCRs",
                    inspection.inspected_on
                ),
                args.yes,
                || delete_inspection(&ctx.store, &inspection.id),
                || get_inspections(&ctx.store),
            )
        }
        InspectionCommands::Show(args) => {
            let inspection: Inspection = ctx.fetch(&args.id)?;
            print_record(&ctx, &inspection)
        }
    }
}

fn fill(ctx: &Context, form: &mut InspectionForm, args: NewArgs) -> Result<()> {
    let i = args.interactive;
    pick::<Project>(ctx, &mut form.project, args.project, i, "Project")?;
    let inspector = args.inspector.or_else(|| ctx.default_inspector());
    pick::<Inspector>(ctx, &mut form.inspector, inspector, i, "Inspector")?;
    pick::<Material>(ctx, &mut form.material, args.material, i, "Material")?;
    edit_choice(
        &mut form.result,
        args.result,
        i,
        "Result",
        &[
            InspectionResult::Pending,
            InspectionResult::Pass,
            InspectionResult::Fail,
        ],
    )?;
    edit_value(&mut form.inspected_on, args.date, i, "Date (YYYY-MM-DD)")?;
    edit_text(&mut form.notes, args.notes, i, "Notes")
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<InspectionForm>::create();
    fill(ctx, modal.form_mut(), args)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| match form.build() {
            Some(inspection) => create_inspection(&ctx.store, inspection),
            None => Err(ActionError::rejected("Please select a project and inspector first")),
        },
        |ins| format!("Recorded inspection {} ({})", ins.short_id, ins.record.result),
    );
    saved(ctx, submitted, "Inspection recorded")?;
    Ok(())
}
