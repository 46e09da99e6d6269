//! `qcd inspector` command - QC inspector management

use clap::Subcommand;
use miette::Result;

use crate::actions::master::{create_inspector, delete_inspector, get_inspectors, update_inspector};
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, edit_text, print_record, run_list, saved, Context,
    DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::specs::InspectorSpec;
use crate::cli::GlobalOpts;
use crate::entities::{Inspector, InspectorStatus};
use crate::views::forms::InspectorForm;
use crate::views::Modal;

#[derive(Subcommand, Debug)]
pub enum InspectorCommands {
    /// List inspectors
    List(ListArgs),

    /// Register an inspector
    New(NewArgs),

    /// Edit an inspector
    Edit(EditArgs),

    /// Delete an inspector without recorded work
    Delete(DeleteArgs),

    /// Show an inspector's details
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct InspectorFields {
    /// Inspector name
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Role (e.g. "Welding Inspector")
    #[arg(long)]
    pub role: Option<String>,

    /// Certification (e.g. "CSWIP 3.1")
    #[arg(long)]
    pub certification: Option<String>,

    /// Status (active, inactive)
    #[arg(long)]
    pub status: Option<InspectorStatus>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: InspectorFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Inspector ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: InspectorFields,
}

pub fn run(cmd: InspectorCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        InspectorCommands::List(args) => {
            run_list(&ctx, &InspectorSpec, &args, || get_inspectors(&ctx.store))
        }
        InspectorCommands::New(args) => run_new(&ctx, args),
        InspectorCommands::Edit(args) => run_edit(&ctx, args),
        InspectorCommands::Delete(args) => run_delete(&ctx, args),
        InspectorCommands::Show(args) => {
            let inspector: Inspector = ctx.fetch(&args.id)?;
            print_record(&ctx, &inspector)
        }
    }
}

fn fill(form: &mut InspectorForm, fields: InspectorFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.name, fields.name, i, "Name")?;
    edit_text(&mut form.email, fields.email, i, "Email")?;
    edit_text(&mut form.role, fields.role, i, "Role")?;
    edit_text(&mut form.certification, fields.certification, i, "Certification")?;
    edit_choice(
        &mut form.status,
        fields.status,
        i,
        "Status",
        &[InspectorStatus::Active, InspectorStatus::Inactive],
    )
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<InspectorForm>::create();
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_inspector(&ctx.store, form.build()),
        |q| format!("Created inspector {} {}", q.short_id, q.record.name),
    );
    saved(ctx, submitted, "Inspector created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let inspector: Inspector = ctx.fetch(&args.id)?;
    let mut modal = Modal::<InspectorForm>::editing(&inspector);
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = inspector.clone();
            form.apply(&mut updated);
            update_inspector(&ctx.store, &updated).map(|_| updated)
        },
        |q| format!("Updated inspector {}", q.name),
    );
    saved(ctx, submitted, "Inspector updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let inspector: Inspector = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("inspector {}", inspector.name),
        args.yes,
        || delete_inspector(&ctx.store, &inspector.id),
        || get_inspectors(&ctx.store),
    )
}
