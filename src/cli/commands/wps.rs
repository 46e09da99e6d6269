//! `qcd wps` command - Welding procedure specifications

use clap::Subcommand;
use miette::Result;

use crate::actions::master::{create_wps, delete_wps, get_wps_list, update_wps};
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, edit_text, print_record, run_list, saved, Context,
    DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::specs::WpsSpec;
use crate::cli::GlobalOpts;
use crate::entities::{WeldProcess, Wps, WpsStatus};
use crate::views::forms::WpsForm;
use crate::views::Modal;

const PROCESSES: [WeldProcess; 4] = [
    WeldProcess::Smaw,
    WeldProcess::Gtaw,
    WeldProcess::Fcaw,
    WeldProcess::Saw,
];

#[derive(Subcommand, Debug)]
pub enum WpsCommands {
    /// List WPS records
    List(ListArgs),

    /// Register a WPS
    New(NewArgs),

    /// Edit a WPS
    Edit(EditArgs),

    /// Delete a WPS
    Delete(DeleteArgs),

    /// Show a WPS
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct WpsFields {
    /// WPS number, unique in the workspace
    #[arg(long)]
    pub number: Option<String>,

    /// Welding process (SMAW, GTAW, FCAW, SAW)
    #[arg(long)]
    pub process: Option<WeldProcess>,

    /// Filler metal classification (e.g. E7018)
    #[arg(long)]
    pub filler: Option<String>,

    /// Qualified positions (e.g. 1G-6G)
    #[arg(long)]
    pub position: Option<String>,

    /// Status (pending, approved)
    #[arg(long)]
    pub status: Option<WpsStatus>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: WpsFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// WPS ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: WpsFields,
}

pub fn run(cmd: WpsCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        WpsCommands::List(args) => run_list(&ctx, &WpsSpec, &args, || get_wps_list(&ctx.store)),
        WpsCommands::New(args) => run_new(&ctx, args),
        WpsCommands::Edit(args) => run_edit(&ctx, args),
        WpsCommands::Delete(args) => run_delete(&ctx, args),
        WpsCommands::Show(args) => {
            let wps: Wps = ctx.fetch(&args.id)?;
            print_record(&ctx, &wps)
        }
    }
}

fn fill(form: &mut WpsForm, fields: WpsFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.number, fields.number, i, "WPS number")?;
    edit_choice(&mut form.process, fields.process, i, "Process", &PROCESSES)?;
    edit_text(&mut form.filler_metal, fields.filler, i, "Filler metal")?;
    edit_text(&mut form.position, fields.position, i, "Positions")?;
    edit_choice(
        &mut form.status,
        fields.status,
        i,
        "Status",
        &[WpsStatus::Pending, WpsStatus::Approved],
    )
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<WpsForm>::create();
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_wps(&ctx.store, form.build()),
        |w| format!("Created {} ({})", w.record.number, w.record.process),
    );
    saved(ctx, submitted, "WPS created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let wps: Wps = ctx.fetch(&args.id)?;
    let mut modal = Modal::<WpsForm>::editing(&wps);
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = wps.clone();
            form.apply(&mut updated);
            update_wps(&ctx.store, &updated).map(|_| updated)
        },
        |w| format!("Updated {}", w.number),
    );
    saved(ctx, submitted, "WPS updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let wps: Wps = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("WPS {}", wps.number),
        args.yes,
        || delete_wps(&ctx.store, &wps.id),
        || get_wps_list(&ctx.store),
    )
}
