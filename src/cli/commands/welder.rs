//! `qcd welder` command - Welder management with repair-rate standing

use clap::Subcommand;
use miette::Result;

use crate::actions::master::{create_welder, delete_welder, get_welders, update_welder};
use crate::cli::commands::common::{
    delete_with_confirm, edit_text, edit_value, print_record, run_list, saved, Context, DeleteArgs,
    ListArgs, ShowArgs,
};
use crate::cli::specs::{ListSpec, WelderSpec};
use crate::cli::GlobalOpts;
use crate::entities::Welder;
use crate::views::forms::WelderForm;
use crate::views::Modal;

#[derive(Subcommand, Debug)]
pub enum WelderCommands {
    /// List welders with weld counts, repair rate and standing
    List(ListArgs),

    /// Register a welder
    New(NewArgs),

    /// Edit a welder
    Edit(EditArgs),

    /// Delete a welder
    Delete(DeleteArgs),

    /// Show a welder with their repair metrics
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct WelderFields {
    /// Welder name
    #[arg(long)]
    pub name: Option<String>,

    /// Qualification / stamp number
    #[arg(long)]
    pub cert_id: Option<String>,

    /// Performance score (0-100)
    #[arg(long)]
    pub score: Option<f64>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: WelderFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Welder ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: WelderFields,
}

pub fn run(cmd: WelderCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let spec = WelderSpec {
        threshold: ctx.config.repair_rate_threshold(),
    };
    match cmd {
        WelderCommands::List(args) => run_list(&ctx, &spec, &args, || get_welders(&ctx.store)),
        WelderCommands::New(args) => run_new(&ctx, args),
        WelderCommands::Edit(args) => run_edit(&ctx, args),
        WelderCommands::Delete(args) => run_delete(&ctx, args),
        WelderCommands::Show(args) => {
            let id = ctx.resolve::<Welder>(&args.id)?;
            let summary = ctx
                .check(get_welders(&ctx.store))?
                .into_iter()
                .find(|w| w.welder.id == id);
            match summary {
                Some(summary) => print_record(&ctx, &spec.record(&summary)),
                None => Err(ctx.fail(&format!("Welder {} not found", args.id))),
            }
        }
    }
}

fn fill(form: &mut WelderForm, fields: WelderFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.name, fields.name, i, "Name")?;
    edit_text(&mut form.cert_id, fields.cert_id, i, "Certification ID")?;
    edit_value(&mut form.score, fields.score, i, "Score (0-100)")
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<WelderForm>::create();
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_welder(&ctx.store, form.build()),
        |w| format!("Created welder {} {}", w.short_id, w.record.name),
    );
    saved(ctx, submitted, "Welder created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let welder: Welder = ctx.fetch(&args.id)?;
    let mut modal = Modal::<WelderForm>::editing(&welder);
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = welder.clone();
            form.apply(&mut updated);
            update_welder(&ctx.store, &updated).map(|_| updated)
        },
        |w| format!("Updated welder {}", w.name),
    );
    saved(ctx, submitted, "Welder updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let welder: Welder = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("welder {}", welder.name),
        args.yes,
        || delete_welder(&ctx.store, &welder.id),
        || get_welders(&ctx.store),
    )
}
