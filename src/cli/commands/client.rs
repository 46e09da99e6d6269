//! `qcd client` command - Client management

use clap::Subcommand;
use miette::Result;

use crate::actions::client::{create_client, delete_client, get_clients, update_client};
use crate::cli::commands::common::{
    delete_with_confirm, edit_text, print_record, run_list, saved, Context, DeleteArgs, ListArgs,
    ShowArgs,
};
use crate::cli::specs::ClientSpec;
use crate::cli::GlobalOpts;
use crate::entities::Client;
use crate::views::forms::ClientForm;
use crate::views::Modal;

#[derive(Subcommand, Debug)]
pub enum ClientCommands {
    /// List clients with their project counts
    List(ListArgs),

    /// Create a new client
    New(NewArgs),

    /// Edit a client
    Edit(EditArgs),

    /// Delete a client that owns no projects
    Delete(DeleteArgs),

    /// Show a client's details
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct ClientFields {
    /// Client name
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Contact person or phone
    #[arg(long)]
    pub contact: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: ClientFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Client ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: ClientFields,
}

pub fn run(cmd: ClientCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        ClientCommands::List(args) => {
            run_list(&ctx, &ClientSpec, &args, || get_clients(&ctx.store))
        }
        ClientCommands::New(args) => run_new(&ctx, args),
        ClientCommands::Edit(args) => run_edit(&ctx, args),
        ClientCommands::Delete(args) => run_delete(&ctx, args),
        ClientCommands::Show(args) => {
            let client: Client = ctx.fetch(&args.id)?;
            print_record(&ctx, &client)
        }
    }
}

fn fill(form: &mut ClientForm, fields: ClientFields) -> Result<()> {
    let i = fields.interactive;
    edit_text(&mut form.name, fields.name, i, "Name")?;
    edit_text(&mut form.email, fields.email, i, "Email")?;
    edit_text(&mut form.contact, fields.contact, i, "Contact")
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<ClientForm>::create();
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_client(&ctx.store, form.build()),
        |c| format!("Created client {} {}", c.short_id, c.record.name),
    );
    saved(ctx, submitted, "Client created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let client: Client = ctx.fetch(&args.id)?;
    let mut modal = Modal::<ClientForm>::editing(&client);
    fill(modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = client.clone();
            form.apply(&mut updated);
            update_client(&ctx.store, &updated).map(|_| updated)
        },
        |c| format!("Updated client {}", c.name),
    );
    saved(ctx, submitted, "Client updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let client: Client = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("client {}", client.name),
        args.yes,
        || delete_client(&ctx.store, &client.id),
        || get_clients(&ctx.store),
    )
}
