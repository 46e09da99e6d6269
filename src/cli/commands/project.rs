//! `qcd project` command - Project management

use clap::Subcommand;
use miette::Result;

use crate::actions::client::{create_project, delete_project, get_projects, update_project};
use crate::cli::commands::common::{
    delete_with_confirm, edit_choice, edit_text, pick, print_record, run_list, saved, Context,
    DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::specs::ProjectSpec;
use crate::cli::GlobalOpts;
use crate::entities::{Client, Project, ProjectStatus};
use crate::views::forms::ProjectForm;
use crate::views::Modal;

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects with client and report counts
    List(ListArgs),

    /// Create a new project for a client
    New(NewArgs),

    /// Edit a project
    Edit(EditArgs),

    /// Delete a project without reports
    Delete(DeleteArgs),

    /// Show a project's details
    Show(ShowArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct ProjectFields {
    /// Project name
    #[arg(long)]
    pub name: Option<String>,

    /// Site or shop location
    #[arg(long)]
    pub location: Option<String>,

    /// Status (ongoing, completed)
    #[arg(long)]
    pub status: Option<ProjectStatus>,

    /// Owning client (ID, short ID or ID prefix)
    #[arg(long, short = 'c')]
    pub client: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: ProjectFields,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Project ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: ProjectFields,
}

pub fn run(cmd: ProjectCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        ProjectCommands::List(args) => {
            run_list(&ctx, &ProjectSpec, &args, || get_projects(&ctx.store))
        }
        ProjectCommands::New(args) => run_new(&ctx, args),
        ProjectCommands::Edit(args) => run_edit(&ctx, args),
        ProjectCommands::Delete(args) => run_delete(&ctx, args),
        ProjectCommands::Show(args) => {
            let project: Project = ctx.fetch(&args.id)?;
            print_record(&ctx, &project)
        }
    }
}

fn fill(ctx: &Context, form: &mut ProjectForm, fields: ProjectFields) -> Result<()> {
    let i = fields.interactive;
    pick::<Client>(ctx, &mut form.client, fields.client, i, "Client")?;
    edit_text(&mut form.name, fields.name, i, "Project name")?;
    edit_text(&mut form.location, fields.location, i, "Location")?;
    edit_choice(
        &mut form.status,
        fields.status,
        i,
        "Status",
        &[ProjectStatus::Ongoing, ProjectStatus::Completed],
    )
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<ProjectForm>::create();
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| match form.build() {
            Some(project) => create_project(&ctx.store, project),
            None => Err(crate::actions::ActionError::rejected("Please select a client first")),
        },
        |p| format!("Created project {} {}", p.short_id, p.record.name),
    );
    saved(ctx, submitted, "Project created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let project: Project = ctx.fetch(&args.id)?;
    let mut modal = Modal::<ProjectForm>::editing(&project);
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = project.clone();
            form.apply(&mut updated);
            update_project(&ctx.store, &updated).map(|_| updated)
        },
        |p| format!("Updated project {}", p.name),
    );
    saved(ctx, submitted, "Project updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let project: Project = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("project {}", project.name),
        args.yes,
        || delete_project(&ctx.store, &project.id),
        || get_projects(&ctx.store),
    )
}
