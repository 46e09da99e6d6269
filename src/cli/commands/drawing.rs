//! `qcd drawing` command - Controlled drawings and revisions

use clap::Subcommand;
use miette::Result;

use crate::actions::master::{
    create_drawing, delete_drawing, get_drawings, revise_drawing, update_drawing,
};
use crate::actions::ActionReply;
use crate::cli::commands::common::{
    delete_with_confirm, edit_text, edit_value, pick, print_record, reply, run_list, saved,
    Context, DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::specs::DrawingSpec;
use crate::cli::GlobalOpts;
use crate::entities::{Drawing, Project};
use crate::views::forms::DrawingForm;
use crate::views::{Modal, Notifier};

#[derive(Subcommand, Debug)]
pub enum DrawingCommands {
    /// List drawings
    List(ListArgs),

    /// Register a drawing
    New(NewArgs),

    /// Edit a drawing
    Edit(EditArgs),

    /// Bump a drawing to its next revision
    Revise(ShowArgs),

    /// Delete a drawing
    Delete(DeleteArgs),

    /// Show a drawing
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct DrawingFields {
    /// Drawing number
    #[arg(long)]
    pub number: Option<String>,

    /// Drawing title
    #[arg(long)]
    pub title: Option<String>,

    /// Revision number
    #[arg(long)]
    pub revision: Option<u32>,

    /// Project the drawing belongs to
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: DrawingFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Drawing ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: DrawingFields,
}

pub fn run(cmd: DrawingCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        DrawingCommands::List(args) => {
            run_list(&ctx, &DrawingSpec, &args, || get_drawings(&ctx.store))
        }
        DrawingCommands::New(args) => run_new(&ctx, args),
        DrawingCommands::Edit(args) => run_edit(&ctx, args),
        DrawingCommands::Revise(args) => {
            let id = ctx.resolve::<Drawing>(&args.id)?;
            let drawing = ctx.check(revise_drawing(&ctx.store, &id))?;
            ctx.notifier.success(&format!(
                "{} is now at revision {}",
                drawing.number, drawing.revision
            ));
            reply(&ctx, ActionReply::ok("Drawing revised", &drawing))
        }
        DrawingCommands::Delete(args) => run_delete(&ctx, args),
        DrawingCommands::Show(args) => {
            let drawing: Drawing = ctx.fetch(&args.id)?;
            print_record(&ctx, &drawing)
        }
    }
}

fn fill(ctx: &Context, form: &mut DrawingForm, fields: DrawingFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.number, fields.number, i, "Drawing number")?;
    edit_text(&mut form.title, fields.title, i, "Title")?;
    edit_value(&mut form.revision, fields.revision, i, "Revision")?;
    pick::<Project>(ctx, &mut form.project, fields.project, i, "Project")
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<DrawingForm>::create();
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_drawing(&ctx.store, form.build()),
        |d| format!("Created drawing {} rev {}", d.record.number, d.record.revision),
    );
    saved(ctx, submitted, "Drawing created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let drawing: Drawing = ctx.fetch(&args.id)?;
    let mut modal = Modal::<DrawingForm>::editing(&drawing);
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = drawing.clone();
            form.apply(&mut updated);
            update_drawing(&ctx.store, &updated).map(|_| updated)
        },
        |d| format!("Updated drawing {}", d.number),
    );
    saved(ctx, submitted, "Drawing updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let drawing: Drawing = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("drawing {}", drawing.number),
        args.yes,
        || delete_drawing(&ctx.store, &drawing.id),
        || get_drawings(&ctx.store),
    )
}
