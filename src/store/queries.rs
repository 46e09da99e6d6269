//! Collection queries with derived data
//!
//! Derived counts are computed here, at the persistence boundary, so list
//! views only ever aggregate over what they were handed.

use std::collections::HashMap;

use rusqlite::{params, Params, Row};

use super::Store;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::entities::{
    Client, ClientSummary, Discipline, Evidence, Inspection, InspectionSummary, Itp, ItpItem,
    ItpSummary, MdrPayload, MdrReport, MdrSummary, Ncr, NcrSummary, Outcome, Project,
    ProjectSummary, Welder, WelderSummary,
};
use crate::views::stats::percentage;

fn count(row: &Row<'_>, column: &str) -> rusqlite::Result<usize> {
    Ok(row.get::<_, i64>(column)?.max(0) as usize)
}

impl Store {
    fn query_list<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        rows.collect()
    }

    /// Clients with their project counts
    pub fn client_summaries(&self) -> rusqlite::Result<Vec<ClientSummary>> {
        self.query_list(
            "SELECT c.*,
                    (SELECT COUNT(*) FROM projects p WHERE p.client_id = c.id) AS project_count
             FROM clients c
             ORDER BY c.name COLLATE NOCASE",
            [],
            |row| {
                Ok(ClientSummary {
                    client: Client::from_row(row)?,
                    project_count: count(row, "project_count")?,
                })
            },
        )
    }

    /// Projects with client name and report count (MDR reports + inspections)
    pub fn project_summaries(&self) -> rusqlite::Result<Vec<ProjectSummary>> {
        self.query_list(
            "SELECT p.*, c.name AS client_name,
                    (SELECT COUNT(*) FROM mdr_reports m WHERE m.project_id = p.id)
                  + (SELECT COUNT(*) FROM inspections i WHERE i.project_id = p.id) AS report_count
             FROM projects p
             LEFT JOIN clients c ON c.id = p.client_id
             ORDER BY p.created DESC",
            [],
            |row| {
                Ok(ProjectSummary {
                    project: Project::from_row(row)?,
                    client_name: row.get("client_name")?,
                    report_count: count(row, "report_count")?,
                })
            },
        )
    }

    /// Welders with total welds and repair rate from the welding reports
    /// that name them. A repair is a weld whose report failed.
    pub fn welder_summaries(&self) -> rusqlite::Result<Vec<WelderSummary>> {
        let welders: Vec<Welder> = self.all()?;
        let reports: Vec<MdrReport> =
            self.select("discipline = ?1", params![Discipline::Welding.as_str()])?;

        let mut tally: HashMap<String, (usize, usize)> = HashMap::new();
        for report in &reports {
            let MdrPayload::Welding(data) = &report.data else {
                continue;
            };
            if data.welder_id.is_empty() {
                continue;
            }
            let entry = tally.entry(data.welder_id.to_ascii_uppercase()).or_default();
            entry.0 += 1;
            if report.status.outcome() == Outcome::Failed {
                entry.1 += 1;
            }
        }

        Ok(welders
            .into_iter()
            .map(|welder| {
                let (total_welds, repairs) = tally
                    .get(&welder.id.to_string())
                    .copied()
                    .unwrap_or_default();
                WelderSummary {
                    welder,
                    total_welds,
                    repairs,
                    repair_rate: percentage(repairs, total_welds),
                }
            })
            .collect())
    }

    /// ITPs with project name, item and evidence counts
    pub fn itp_summaries(&self) -> rusqlite::Result<Vec<ItpSummary>> {
        self.query_list(
            "SELECT t.*, p.name AS project_name,
                    (SELECT COUNT(*) FROM itp_items it WHERE it.itp_id = t.id) AS item_count,
                    (SELECT COUNT(*) FROM itp_items it WHERE it.itp_id = t.id AND it.hold_point = 1) AS hold_points,
                    (SELECT COUNT(*) FROM evidence e WHERE e.itp_id = t.id) AS evidence_count
             FROM itps t
             LEFT JOIN projects p ON p.id = t.project_id
             ORDER BY t.created DESC",
            [],
            |row| {
                Ok(ItpSummary {
                    itp: Itp::from_row(row)?,
                    project_name: row.get("project_name")?,
                    item_count: count(row, "item_count")?,
                    hold_points: count(row, "hold_points")?,
                    evidence_count: count(row, "evidence_count")?,
                })
            },
        )
    }

    /// Items of an ITP in insertion order
    pub fn itp_items(&self, itp_id: &EntityId) -> rusqlite::Result<Vec<ItpItem>> {
        self.select("itp_id = ?1", [itp_id])
    }

    /// Sequence number for the next item appended to an ITP
    pub fn next_item_seq(&self, itp_id: &EntityId) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM itp_items WHERE itp_id = ?1",
            [itp_id],
            |row| row.get(0),
        )
    }

    pub fn itp_evidence(&self, itp_id: &EntityId) -> rusqlite::Result<Vec<Evidence>> {
        self.select("itp_id = ?1", [itp_id])
    }

    pub fn ncr_evidence(&self, ncr_id: &EntityId) -> rusqlite::Result<Vec<Evidence>> {
        self.select("ncr_id = ?1", [ncr_id])
    }

    /// Inspections with project/inspector names and NCR counts
    pub fn inspection_summaries(&self) -> rusqlite::Result<Vec<InspectionSummary>> {
        self.query_list(
            "SELECT i.*, p.name AS project_name, q.name AS inspector_name,
                    (SELECT COUNT(*) FROM ncrs n WHERE n.inspection_id = i.id) AS ncr_count
             FROM inspections i
             LEFT JOIN projects p ON p.id = i.project_id
             LEFT JOIN inspectors q ON q.id = i.inspector_id
             ORDER BY i.inspected_on DESC, i.created DESC",
            [],
            |row| {
                Ok(InspectionSummary {
                    inspection: Inspection::from_row(row)?,
                    project_name: row.get("project_name")?,
                    inspector_name: row.get("inspector_name")?,
                    ncr_count: count(row, "ncr_count")?,
                })
            },
        )
    }

    /// NCRs with the context of their backing inspection
    pub fn ncr_summaries(&self) -> rusqlite::Result<Vec<NcrSummary>> {
        self.query_list(
            "SELECT n.*, p.name AS project_name, q.name AS inspector_name,
                    mat.mark_no AS material_mark,
                    (SELECT COUNT(*) FROM evidence e WHERE e.ncr_id = n.id) AS evidence_count
             FROM ncrs n
             LEFT JOIN inspections i ON i.id = n.inspection_id
             LEFT JOIN projects p ON p.id = i.project_id
             LEFT JOIN inspectors q ON q.id = i.inspector_id
             LEFT JOIN materials mat ON mat.id = n.material_id
             ORDER BY n.created DESC",
            [],
            |row| {
                Ok(NcrSummary {
                    ncr: Ncr::from_row(row)?,
                    project_name: row.get("project_name")?,
                    inspector_name: row.get("inspector_name")?,
                    material_mark: row.get("material_mark")?,
                    evidence_count: count(row, "evidence_count")?,
                })
            },
        )
    }

    /// Highest sequence number among `NCR-<year>-NNNN` numbers
    pub fn last_ncr_sequence(&self, year: i32) -> rusqlite::Result<usize> {
        let prefix = format!("NCR-{}-", year);
        let numbers: Vec<String> = self.query_list(
            "SELECT ncr_number FROM ncrs WHERE ncr_number LIKE ?1",
            [format!("{}%", prefix)],
            |row| row.get(0),
        )?;
        Ok(numbers
            .iter()
            .filter_map(|n| n.strip_prefix(&prefix)?.parse::<usize>().ok())
            .max()
            .unwrap_or(0))
    }

    /// MDR reports, optionally restricted to one discipline
    pub fn mdr_summaries(&self, discipline: Option<Discipline>) -> rusqlite::Result<Vec<MdrSummary>> {
        let map = |row: &Row<'_>| {
            Ok(MdrSummary {
                report: MdrReport::from_row(row)?,
                project_name: row.get("project_name")?,
                inspector_name: row.get("inspector_name")?,
            })
        };
        let base = "SELECT m.*, p.name AS project_name, q.name AS inspector_name
             FROM mdr_reports m
             LEFT JOIN projects p ON p.id = m.project_id
             LEFT JOIN inspectors q ON q.id = m.inspector_id";
        match discipline {
            Some(d) => self.query_list(
                &format!("{} WHERE m.discipline = ?1 ORDER BY m.created DESC", base),
                [d.as_str()],
                map,
            ),
            None => self.query_list(&format!("{} ORDER BY m.created DESC", base), [], map),
        }
    }
}
