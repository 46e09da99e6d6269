//! `qcd validate` command - Check stored MDR payloads against their schemas

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::actions::mdr::{check_integrity, IntegrityIssue};
use crate::cli::commands::common::Context;
use crate::cli::{GlobalOpts, OutputFormat, Reported};
use crate::entities::Discipline;
use crate::schema::Validator;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Only print the counts
    #[arg(long)]
    pub summary: bool,
}

#[derive(Serialize)]
struct IntegrityReport<'a> {
    scanned: usize,
    issues: &'a [IntegrityIssue],
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let validator = Validator::default();
    for discipline in Discipline::all() {
        if !validator.has_schema(*discipline) {
            tracing::warn!(%discipline, "no schema loaded; payloads are only checked for readability");
        }
    }
    let (scanned, issues) = ctx.check(check_integrity(&ctx.store, &validator))?;

    let clean = issues.is_empty();
    match ctx.format {
        OutputFormat::Json => {
            let report = IntegrityReport { scanned, issues: &issues };
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let report = IntegrityReport { scanned, issues: &issues };
            print!("{}", serde_yml::to_string(&report).into_diagnostic()?);
        }
        _ => print_issues(scanned, issues, args.summary, global.quiet),
    }

    if clean {
        Ok(())
    } else {
        Err(Reported.into())
    }
}

fn print_issues(scanned: usize, issues: Vec<IntegrityIssue>, summary: bool, quiet: bool) {
    let count = issues.len();
    if !summary && !quiet {
        for issue in issues {
            let flag = match &issue.diagnostic {
                _ if issue.malformed => style("unreadable".to_string()).red().to_string(),
                Some(diagnostic) => style(format!("{} violation(s)", diagnostic.violation_count()))
                    .yellow()
                    .to_string(),
                None => style("invalid".to_string()).yellow().to_string(),
            };
            println!(
                "{} {} report {} ({})",
                style("✗").red(),
                issue.discipline.label(),
                style(&issue.short_id).cyan(),
                flag
            );
            match issue.diagnostic {
                Some(diagnostic) => {
                    // Rendered with the offending payload as source
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
                None => {
                    for message in &issue.messages {
                        println!("    {}", message);
                    }
                }
            }
        }
        if count > 0 {
            println!();
        }
    }

    if count == 0 {
        println!(
            "{} {} report(s) checked, all valid",
            style("✓").green(),
            scanned
        );
    } else {
        println!(
            "{} {} of {} report(s) need attention",
            style("!").yellow(),
            count,
            scanned
        );
    }
}
