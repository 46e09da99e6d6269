//! Dashboard aggregates across every collection

use serde::Serialize;

use crate::actions::ActionResult;
use crate::entities::{
    Client, Discipline, Inspector, Itp, ItpStatus, Material, MdrReport, Ncr, NcrStatus, Outcome,
    Project, ProjectStatus,
};
use crate::store::Store;
use crate::views::stats::{percentage, ratio};

/// Report count and pass rate of one discipline
#[derive(Debug, Clone, Serialize)]
pub struct DisciplineStats {
    pub discipline: Discipline,
    pub reports: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NcrStats {
    pub open: usize,
    pub on_progress: usize,
    pub closed: usize,
    pub closure_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ItpStats {
    pub draft: usize,
    pub issued: usize,
    pub approved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub clients: usize,
    pub projects: usize,
    pub active_projects: usize,
    pub materials: usize,
    /// Sum of material total weights in kg
    pub material_weight: f64,
    pub inspectors: usize,
    pub welders: usize,
    pub welder_repair_rate: f64,
    pub ncrs: NcrStats,
    pub itps: ItpStats,
    pub mdr_reports: usize,
    pub mdr_pass_rate: f64,
    pub disciplines: Vec<DisciplineStats>,
}

fn ncr_stats(ncrs: &[Ncr]) -> NcrStats {
    let mut stats = NcrStats::default();
    for ncr in ncrs {
        match ncr.status {
            NcrStatus::Open => stats.open += 1,
            NcrStatus::OnProgress => stats.on_progress += 1,
            NcrStatus::Closed => stats.closed += 1,
        }
    }
    stats.closure_rate = percentage(stats.closed, ncrs.len());
    stats
}

fn itp_stats(itps: &[Itp]) -> ItpStats {
    let mut stats = ItpStats::default();
    for itp in itps {
        match itp.status {
            ItpStatus::Draft => stats.draft += 1,
            ItpStatus::Issued => stats.issued += 1,
            ItpStatus::Approved => stats.approved += 1,
        }
    }
    stats
}

fn discipline_stats(reports: &[MdrReport]) -> Vec<DisciplineStats> {
    let mut stats: Vec<DisciplineStats> = Discipline::all()
        .iter()
        .map(|d| DisciplineStats {
            discipline: *d,
            reports: 0,
            passed: 0,
            failed: 0,
            pass_rate: 0.0,
        })
        .collect();

    for report in reports {
        let Some(entry) = stats.iter_mut().find(|s| s.discipline == report.discipline) else {
            continue;
        };
        entry.reports += 1;
        match report.status.outcome() {
            Outcome::Passed => entry.passed += 1,
            Outcome::Failed => entry.failed += 1,
            Outcome::Open => {}
        }
    }
    for entry in &mut stats {
        entry.pass_rate = percentage(entry.passed, entry.reports);
    }
    stats
}

/// Compute every dashboard aggregate, one pass per collection
pub fn get_dashboard(store: &Store) -> ActionResult<DashboardStats> {
    let projects = store.all::<Project>()?;
    let materials = store.all::<Material>()?;
    let ncrs = store.all::<Ncr>()?;
    let itps = store.all::<Itp>()?;
    let reports = store.all::<MdrReport>()?;
    let welders = store.welder_summaries()?;

    let passed = reports
        .iter()
        .filter(|r| r.status.outcome() == Outcome::Passed)
        .count();

    Ok(DashboardStats {
        clients: store.count::<Client>()?,
        projects: projects.len(),
        active_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Ongoing)
            .count(),
        materials: materials.len(),
        material_weight: materials.iter().map(|m| m.fields.total_weight).sum(),
        inspectors: store.count::<Inspector>()?,
        welders: welders.len(),
        welder_repair_rate: ratio(welders.iter().map(|w| w.repair_rate).sum(), welders.len()),
        ncrs: ncr_stats(&ncrs),
        itps: itp_stats(&itps),
        mdr_reports: reports.len(),
        mdr_pass_rate: percentage(passed, reports.len()),
        disciplines: discipline_stats(&reports),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};
    use crate::entities::{MdrPayload, ReportStatus};

    #[test]
    fn test_empty_store_reports_zero_rates() {
        let store = Store::open_in_memory().unwrap();
        let stats = get_dashboard(&store).unwrap();
        assert_eq!(stats.mdr_pass_rate, 0.0);
        assert_eq!(stats.ncrs.closure_rate, 0.0);
        assert_eq!(stats.welder_repair_rate, 0.0);
        assert!(stats.disciplines.iter().all(|d| d.pass_rate == 0.0));
    }

    #[test]
    fn test_ncr_closure_rate() {
        let inspection = EntityId::new(EntityPrefix::Ins);
        let mut ncrs: Vec<Ncr> = (0..4)
            .map(|i| Ncr::new(format!("NCR-{}", i), "x".to_string(), inspection.clone()))
            .collect();
        ncrs[0].set_status(NcrStatus::Closed);
        ncrs[1].set_status(NcrStatus::OnProgress);
        let stats = ncr_stats(&ncrs);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.on_progress, 1);
        assert_eq!(stats.closure_rate, 25.0);
    }

    #[test]
    fn test_discipline_pass_rate() {
        let project = EntityId::new(EntityPrefix::Prj);
        let inspector = EntityId::new(EntityPrefix::Qci);
        let report = |status| {
            let mut r = MdrReport::new(
                MdrPayload::empty(Discipline::Ndt),
                project.clone(),
                inspector.clone(),
            );
            r.status = status;
            r
        };
        let reports = vec![
            report(ReportStatus::Pass),
            report(ReportStatus::Fail),
            report(ReportStatus::Pass),
            report(ReportStatus::Pending),
        ];
        let stats = discipline_stats(&reports);
        let ndt = stats.iter().find(|s| s.discipline == Discipline::Ndt).unwrap();
        assert_eq!(ndt.reports, 4);
        assert_eq!(ndt.failed, 1);
        assert_eq!(ndt.pass_rate, 50.0);
    }
}
