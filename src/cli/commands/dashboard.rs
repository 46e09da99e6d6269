//! `qcd dashboard` command - key figures across every collection

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::actions::dashboard::{get_dashboard, DashboardStats};
use crate::cli::commands::common::{detail_table, Context};
use crate::cli::table::render_stat_cards;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::Standing;
use crate::views::{StatCard, Tone};

#[derive(clap::Args, Debug)]
pub struct DashboardArgs {
    /// Hide the per-discipline MDR table
    #[arg(long)]
    pub brief: bool,
}

pub fn run(args: DashboardArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global)?;
    let stats = ctx.check(get_dashboard(&ctx.store))?;

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&stats).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    let markdown = ctx.format == OutputFormat::Md;
    let threshold = ctx.config.repair_rate_threshold();

    section("Master data", &master_cards(&stats, threshold), markdown);
    section("Quality", &quality_cards(&stats), markdown);

    if !args.brief {
        println!("{}", style("MDR reports").bold());
        println!("{}", discipline_table(&stats, markdown));
    }
    Ok(())
}

fn section(title: &str, cards: &[StatCard], markdown: bool) {
    println!("{}", style(title).bold());
    println!("{}", render_stat_cards(cards, markdown));
    println!();
}

fn master_cards(stats: &DashboardStats, threshold: f64) -> Vec<StatCard> {
    let welder_tone = match Standing::from_repair_rate(stats.welder_repair_rate, threshold) {
        Standing::Pass => Tone::Good,
        Standing::Fail => Tone::Bad,
    };
    vec![
        StatCard::count("Clients", stats.clients),
        StatCard::count("Active projects", stats.active_projects),
        StatCard::count("Projects", stats.projects),
        StatCard::count("Materials", stats.materials),
        StatCard::number("Weight", stats.material_weight, 1, "kg"),
        StatCard::count("Inspectors", stats.inspectors),
        StatCard::count("Welders", stats.welders),
        StatCard::percent("Repair rate", stats.welder_repair_rate).tone(welder_tone),
    ]
}

fn quality_cards(stats: &DashboardStats) -> Vec<StatCard> {
    vec![
        StatCard::count("Open NCRs", stats.ncrs.open).alert_if_nonzero(stats.ncrs.open),
        StatCard::count("On progress", stats.ncrs.on_progress),
        StatCard::count("Closed NCRs", stats.ncrs.closed),
        StatCard::percent("Closure rate", stats.ncrs.closure_rate),
        StatCard::count("ITP draft", stats.itps.draft),
        StatCard::count("ITP issued", stats.itps.issued),
        StatCard::count("ITP approved", stats.itps.approved),
        StatCard::count("MDR reports", stats.mdr_reports),
        StatCard::percent("MDR pass rate", stats.mdr_pass_rate),
    ]
}

fn discipline_table(stats: &DashboardStats, markdown: bool) -> String {
    let rows = stats
        .disciplines
        .iter()
        .map(|d| {
            vec![
                d.discipline.label().to_string(),
                d.reports.to_string(),
                d.passed.to_string(),
                d.failed.to_string(),
                format!("{:.1}%", d.pass_rate),
            ]
        })
        .collect();
    detail_table(
        &["Discipline", "Reports", "Passed", "Failed", "Pass rate"],
        rows,
        markdown,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::dashboard::{DisciplineStats, ItpStats, NcrStats};
    use crate::entities::Discipline;

    fn empty_stats() -> DashboardStats {
        DashboardStats {
            clients: 0,
            projects: 0,
            active_projects: 0,
            materials: 0,
            material_weight: 0.0,
            inspectors: 0,
            welders: 0,
            welder_repair_rate: 0.0,
            ncrs: NcrStats::default(),
            itps: ItpStats::default(),
            mdr_reports: 0,
            mdr_pass_rate: 0.0,
            disciplines: vec![DisciplineStats {
                discipline: Discipline::Ndt,
                reports: 0,
                passed: 0,
                failed: 0,
                pass_rate: 0.0,
            }],
        }
    }

    #[test]
    fn test_open_ncrs_are_alerted() {
        let mut stats = empty_stats();
        assert_eq!(quality_cards(&stats)[0].tone, Tone::Good);
        stats.ncrs.open = 2;
        assert_eq!(quality_cards(&stats)[0].tone, Tone::Bad);
    }

    #[test]
    fn test_discipline_table_lists_rates() {
        let table = discipline_table(&empty_stats(), true);
        assert!(table.contains("NDT"));
        assert!(table.contains("0.0%"));
    }

    #[test]
    fn test_welder_rate_tone() {
        let mut stats = empty_stats();
        stats.welder_repair_rate = 8.0;
        let cards = master_cards(&stats, 5.0);
        assert_eq!(cards.last().map(|c| c.tone), Some(Tone::Bad));
    }
}
