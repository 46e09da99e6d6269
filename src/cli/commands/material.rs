//! `qcd material` command - Mark list management, spreadsheet import and export

use std::path::PathBuf;

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::actions::master::{
    create_material, delete_material, get_materials, import_materials, update_material,
};
use crate::actions::{ActionReply, ActionResult};
use crate::cli::commands::common::{
    delete_with_confirm, edit_text, edit_value, export_list, pick, print_record, reply, run_list,
    saved, Context, DeleteArgs, ListArgs, ShowArgs,
};
use crate::cli::prompt::TerminalConfirm;
use crate::cli::specs::{ListSpec, MaterialSpec};
use crate::cli::table::TableFormatter;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::entities::{Material, Project};
use crate::export::ExportFormat;
use crate::import::{self, ImportError, ImportPreview};
use crate::views::forms::MaterialForm;
use crate::views::{Confirm, FilterRow, MaterialFilter, Modal, Notifier};

#[derive(Subcommand, Debug)]
pub enum MaterialCommands {
    /// List materials with text search and field filters
    List(MaterialListArgs),

    /// Add one mark list entry
    New(NewArgs),

    /// Edit a material
    Edit(EditArgs),

    /// Delete a material
    Delete(DeleteArgs),

    /// Show a material's details
    Show(ShowArgs),

    /// Import a mark list from .xlsx, .xls or .csv
    Import(ImportArgs),

    /// Export the filtered list as PDF or Markdown
    Export(ExportArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct MaterialFilterArgs {
    /// Filter row such as "drawing=D-1,heat=H9"; repeat for OR
    #[arg(long = "where", value_name = "FIELD=VALUE,...")]
    pub filters: Vec<String>,

    /// Only materials of this project
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct MaterialListArgs {
    #[command(flatten)]
    pub list: ListArgs,

    #[command(flatten)]
    pub filter: MaterialFilterArgs,
}

#[derive(clap::Args, Debug, Default)]
pub struct MaterialFieldArgs {
    /// Drawing number
    #[arg(long)]
    pub drawing: Option<String>,

    /// Mark number
    #[arg(long)]
    pub mark: Option<String>,

    /// Mark specification (profile / size)
    #[arg(long)]
    pub mark_spec: Option<String>,

    /// Material specification (grade)
    #[arg(long)]
    pub material: Option<String>,

    /// Quantity
    #[arg(long)]
    pub qty: Option<i64>,

    /// Length in mm
    #[arg(long)]
    pub length: Option<f64>,

    /// Width in mm
    #[arg(long)]
    pub width: Option<f64>,

    /// Height or thickness in mm
    #[arg(long)]
    pub height: Option<f64>,

    /// Total weight in kg
    #[arg(long)]
    pub weight: Option<f64>,

    /// Total area in m²
    #[arg(long)]
    pub area: Option<f64>,

    /// Heat number
    #[arg(long)]
    pub heat: Option<String>,

    /// Assembly mark
    #[arg(long)]
    pub assembly: Option<String>,

    /// Paint system
    #[arg(long)]
    pub paint: Option<String>,

    /// Remark
    #[arg(long)]
    pub remark: Option<String>,

    /// Project the material belongs to
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Prompt for every field
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: MaterialFieldArgs,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Material ID or short ID
    pub id: String,

    #[command(flatten)]
    pub fields: MaterialFieldArgs,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Spreadsheet to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Assign every imported row to this project
    #[arg(long, short = 'p')]
    pub project: Option<String>,

    /// Show the preview and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Commit without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the canonical CSV header row and exit
    #[arg(long)]
    pub template: bool,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "pdf")]
    pub to: ExportFormat,

    /// Case-insensitive free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    #[command(flatten)]
    pub filter: MaterialFilterArgs,
}

pub fn run(cmd: MaterialCommands, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    match cmd {
        MaterialCommands::List(args) => {
            let spec = material_spec(&ctx, &args.filter)?;
            let project = ctx.resolve_opt::<Project>(args.filter.project.as_deref())?;
            run_list(&ctx, &spec, &args.list, || materials_of(&ctx, project.as_ref()))
        }
        MaterialCommands::New(args) => run_new(&ctx, args),
        MaterialCommands::Edit(args) => run_edit(&ctx, args),
        MaterialCommands::Delete(args) => run_delete(&ctx, args),
        MaterialCommands::Show(args) => {
            let material: Material = ctx.fetch(&args.id)?;
            print_record(&ctx, &material)
        }
        MaterialCommands::Import(args) => run_import(&ctx, args),
        MaterialCommands::Export(args) => run_export(&ctx, args),
    }
}

fn material_spec(ctx: &Context, filter: &MaterialFilterArgs) -> Result<MaterialSpec> {
    let rows = filter
        .filters
        .iter()
        .map(|f| FilterRow::parse(f))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ctx.fail(&e))?;
    Ok(MaterialSpec {
        filter: MaterialFilter::new(rows),
    })
}

fn materials_of(ctx: &Context, project: Option<&EntityId>) -> ActionResult<Vec<Material>> {
    let materials = get_materials(&ctx.store)?;
    Ok(match project {
        Some(id) => materials
            .into_iter()
            .filter(|m| m.project_id.as_ref() == Some(id))
            .collect(),
        None => materials,
    })
}

fn fill(ctx: &Context, form: &mut MaterialForm, args: MaterialFieldArgs) -> Result<()> {
    let i = args.interactive;
    let f = &mut form.fields;
    pick::<Project>(ctx, &mut form.project, args.project, i, "Project")?;
    edit_text(&mut f.drawing_no, args.drawing, i, "Drawing no")?;
    edit_text(&mut f.mark_no, args.mark, i, "Mark no")?;
    edit_text(&mut f.mark_spec, args.mark_spec, i, "Mark spec")?;
    edit_text(&mut f.material_spec, args.material, i, "Material spec")?;
    edit_value(&mut f.quantity, args.qty, i, "Quantity")?;
    edit_value(&mut f.length, args.length, i, "Length (mm)")?;
    edit_value(&mut f.width, args.width, i, "Width (mm)")?;
    edit_value(&mut f.height, args.height, i, "Height (mm)")?;
    edit_value(&mut f.total_weight, args.weight, i, "Total weight (kg)")?;
    edit_value(&mut f.total_area, args.area, i, "Total area (m²)")?;
    edit_text(&mut f.heat_no, args.heat, i, "Heat no")?;
    edit_text(&mut f.assembly_mark, args.assembly, i, "Assembly mark")?;
    edit_text(&mut f.paint_system, args.paint, i, "Paint system")?;
    edit_text(&mut f.remark, args.remark, i, "Remark")
}

fn run_new(ctx: &Context, args: NewArgs) -> Result<()> {
    let mut modal = Modal::<MaterialForm>::create();
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| create_material(&ctx.store, form.build()),
        |m| format!("Created material {} {}", m.short_id, m.record.fields.mark_no),
    );
    saved(ctx, submitted, "Material created")?;
    Ok(())
}

fn run_edit(ctx: &Context, args: EditArgs) -> Result<()> {
    let material: Material = ctx.fetch(&args.id)?;
    let mut modal = Modal::<MaterialForm>::editing(&material);
    fill(ctx, modal.form_mut(), args.fields)?;

    let submitted = modal.submit(
        &ctx.notifier,
        |form| {
            let mut updated = material.clone();
            form.apply(&mut updated);
            update_material(&ctx.store, &updated).map(|_| updated)
        },
        |m| format!("Updated material {}", m.fields.mark_no),
    );
    saved(ctx, submitted, "Material updated")?;
    Ok(())
}

fn run_delete(ctx: &Context, args: DeleteArgs) -> Result<()> {
    let material: Material = ctx.fetch(&args.id)?;
    delete_with_confirm(
        ctx,
        &format!("material {}", material.fields.mark_no),
        args.yes,
        || delete_material(&ctx.store, &material.id),
        || get_materials(&ctx.store),
    )
}

fn run_import(ctx: &Context, args: ImportArgs) -> Result<()> {
    if args.template {
        println!("{}", import::template_header());
        return Ok(());
    }
    let Some(file) = args.file else {
        return Err(ctx.fail("Choose a file to import"));
    };
    let project = ctx.resolve_opt::<Project>(args.project.as_deref())?;

    let path = ctx.workspace.resolve(&file);
    let preview = import::load(&path).map_err(|e| ctx.fail(&e.to_string()))?;
    show_preview(ctx, &preview)?;

    if !preview.can_commit() {
        if preview.has_errors() {
            return Err(ctx.fail(&ImportError::Blocked(preview.errors.len()).to_string()));
        }
        ctx.notifier.info("Nothing to import");
        return Ok(());
    }
    if args.dry_run {
        ctx.notifier.info(&format!(
            "Dry run: {} material(s) would be imported",
            preview.rows.len()
        ));
        return Ok(());
    }

    let mut confirm = TerminalConfirm::new(args.yes);
    if !confirm.confirm(&format!("Import {} material(s)?", preview.rows.len())) {
        ctx.notifier.info("Import cancelled");
        return Ok(());
    }

    let rows = preview.into_fields().map_err(|e| ctx.fail(&e.to_string()))?;
    let created = ctx.check(import_materials(&ctx.store, rows, project))?;
    ctx.notifier
        .success(&format!("Imported {} material(s)", created));
    reply(ctx, ActionReply::ok("Imported", created))
}

fn show_preview(ctx: &Context, preview: &ImportPreview) -> Result<()> {
    if ctx.format.is_structured() {
        return match ctx.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(preview).into_diagnostic()?);
                Ok(())
            }
            _ => {
                print!("{}", serde_yml::to_string(preview).into_diagnostic()?);
                Ok(())
            }
        };
    }

    if !preview.ignored_columns.is_empty() {
        ctx.notifier.info(&format!(
            "Ignoring unknown columns: {}",
            preview.ignored_columns.join(", ")
        ));
    }

    let spec = MaterialSpec::default();
    let rows: Vec<_> = preview
        .preview()
        .iter()
        .enumerate()
        .map(|(i, fields)| spec.row(&Material::new(fields.clone()), format!("#{}", i + 1)))
        .collect();
    if !rows.is_empty() {
        println!(
            "{} {} row(s) mapped, showing the first {}",
            style("Preview:").bold(),
            preview.rows.len(),
            rows.len()
        );
        TableFormatter::new(spec.columns(), MaterialSpec::NAME, "#").output(&rows, ctx.format);
    }

    for error in &preview.errors {
        ctx.notifier.error(&error.to_string());
    }
    Ok(())
}

fn run_export(ctx: &Context, args: ExportArgs) -> Result<()> {
    let spec = material_spec(ctx, &args.filter)?;
    let project = ctx.resolve_opt::<Project>(args.filter.project.as_deref())?;
    let search = args.search.as_deref().unwrap_or("");

    let rows: Vec<Material> = ctx
        .check(materials_of(ctx, project.as_ref()))?
        .into_iter()
        .filter(|m| spec.matches(m, search))
        .collect();
    export_list(ctx, &spec, "Material List", "Material_List", &rows, args.to)
}
