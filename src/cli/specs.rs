//! Per-entity list configuration
//!
//! A [`ListSpec`] says how one collection is shown: its columns, how a record
//! becomes a table row, which fields free-text search looks at, and the stat
//! cards computed from the rows currently shown. `commands::common::run_list`
//! drives every one of them the same way.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::cli::table::{CellValue, ColumnDef, TableRow};
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::entities::{
    Client, ClientSummary, Discipline, Drawing, Inspection, InspectionResult, InspectionSummary,
    Inspector, InspectorStatus, Itp, ItpStatus, ItpSummary, Material, MdrPayload, MdrReport,
    MdrSummary, Ncr, NcrStatus, NcrSummary, Outcome, Project, ProjectStatus, ProjectSummary,
    Standing, Welder, WelderSummary, Wps, WpsStatus,
};
use crate::views::filter::{matches_any, text_fields};
use crate::views::stats::{percentage, ratio};
use crate::views::{MaterialFilter, StatCard, Tone};

/// How one collection is listed
pub trait ListSpec {
    type Row: Serialize;

    /// Singular display name, e.g. "material"
    const NAME: &'static str;
    /// Short ID prefix, e.g. "MAT"
    const PREFIX: &'static str;

    fn columns(&self) -> &'static [ColumnDef];

    fn id<'a>(&self, row: &'a Self::Row) -> &'a EntityId;

    /// Build the table row; `short_id` is the row's `PREFIX@N`
    fn row(&self, row: &Self::Row, short_id: String) -> TableRow;

    /// Fields free-text search looks at
    fn search_fields<'a>(&self, row: &'a Self::Row) -> Vec<&'a str>;

    fn matches(&self, row: &Self::Row, search: &str) -> bool {
        matches_any(&self.search_fields(row), search)
    }

    /// Stat cards over the rows being shown
    fn stats(&self, rows: &[Self::Row]) -> Vec<StatCard>;

    /// Structured (JSON/YAML) form of a row
    fn record(&self, row: &Self::Row) -> JsonValue {
        serde_json::to_value(row).unwrap_or(JsonValue::Null)
    }
}

fn tone_for_outcome(outcome: Outcome) -> Tone {
    match outcome {
        Outcome::Passed => Tone::Good,
        Outcome::Failed => Tone::Bad,
        Outcome::Open => Tone::Warn,
    }
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

// ===== Clients =====

pub struct ClientSpec;

const CLIENT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("email", "EMAIL", 28),
    ColumnDef::new("contact", "CONTACT", 20),
    ColumnDef::new("projects", "PROJECTS", 10),
    ColumnDef::new("created", "CREATED", 12),
];

impl ListSpec for ClientSpec {
    type Row = ClientSummary;
    const NAME: &'static str = Client::NAME;
    const PREFIX: &'static str = "CLT";

    fn columns(&self) -> &'static [ColumnDef] {
        CLIENT_COLUMNS
    }

    fn id<'a>(&self, row: &'a ClientSummary) -> &'a EntityId {
        &row.client.id
    }

    fn row(&self, row: &ClientSummary, short_id: String) -> TableRow {
        let c = &row.client;
        TableRow::new(c.id.to_string(), short_id)
            .cell("name", CellValue::text(&c.name))
            .cell("email", CellValue::opt(c.email.as_deref()))
            .cell("contact", CellValue::opt(c.contact.as_deref()))
            .cell("projects", CellValue::count(row.project_count))
            .cell("created", CellValue::Date(c.created))
    }

    fn search_fields<'a>(&self, row: &'a ClientSummary) -> Vec<&'a str> {
        vec![&row.client.name, opt(&row.client.email), opt(&row.client.contact)]
    }

    fn stats(&self, rows: &[ClientSummary]) -> Vec<StatCard> {
        let with_projects = rows.iter().filter(|r| r.project_count > 0).count();
        let projects: usize = rows.iter().map(|r| r.project_count).sum();
        vec![
            StatCard::count("Clients", rows.len()),
            StatCard::count("With projects", with_projects),
            StatCard::count("Projects", projects),
        ]
    }
}

// ===== Projects =====

pub struct ProjectSpec;

const PROJECT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("client", "CLIENT", 24),
    ColumnDef::new("location", "LOCATION", 20),
    ColumnDef::new("status", "STATUS", 11),
    ColumnDef::new("reports", "REPORTS", 9),
];

impl ListSpec for ProjectSpec {
    type Row = ProjectSummary;
    const NAME: &'static str = Project::NAME;
    const PREFIX: &'static str = "PRJ";

    fn columns(&self) -> &'static [ColumnDef] {
        PROJECT_COLUMNS
    }

    fn id<'a>(&self, row: &'a ProjectSummary) -> &'a EntityId {
        &row.project.id
    }

    fn row(&self, row: &ProjectSummary, short_id: String) -> TableRow {
        let p = &row.project;
        let tone = match p.status {
            ProjectStatus::Ongoing => Tone::Warn,
            ProjectStatus::Completed => Tone::Good,
        };
        TableRow::new(p.id.to_string(), short_id)
            .cell("name", CellValue::text(&p.name))
            .cell("client", CellValue::opt(row.client_name.as_deref()))
            .cell("location", CellValue::opt(p.location.as_deref()))
            .cell("status", CellValue::status(p.status, tone))
            .cell("reports", CellValue::count(row.report_count))
    }

    fn search_fields<'a>(&self, row: &'a ProjectSummary) -> Vec<&'a str> {
        vec![
            &row.project.name,
            opt(&row.project.location),
            opt(&row.client_name),
        ]
    }

    fn stats(&self, rows: &[ProjectSummary]) -> Vec<StatCard> {
        let ongoing = rows
            .iter()
            .filter(|r| r.project.status == ProjectStatus::Ongoing)
            .count();
        let reports: usize = rows.iter().map(|r| r.report_count).sum();
        vec![
            StatCard::count("Projects", rows.len()),
            StatCard::count("Ongoing", ongoing),
            StatCard::count("Completed", rows.len() - ongoing),
            StatCard::count("Reports", reports),
        ]
    }
}

// ===== Materials =====

/// Materials with the structured filter rows from `--where`
#[derive(Default)]
pub struct MaterialSpec {
    pub filter: MaterialFilter,
}

const MATERIAL_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("drawing", "DRAWING", 14),
    ColumnDef::new("mark", "MARK", 10),
    ColumnDef::new("spec", "MARK SPEC", 16),
    ColumnDef::new("material", "MATERIAL", 12),
    ColumnDef::new("qty", "QTY", 6),
    ColumnDef::new("weight", "WEIGHT", 10),
    ColumnDef::new("area", "AREA", 9),
    ColumnDef::new("heat", "HEAT", 12),
    ColumnDef::new("assembly", "ASSY", 10),
    ColumnDef::new("paint", "PAINT", 10),
];

impl ListSpec for MaterialSpec {
    type Row = Material;
    const NAME: &'static str = Material::NAME;
    const PREFIX: &'static str = "MAT";

    fn columns(&self) -> &'static [ColumnDef] {
        MATERIAL_COLUMNS
    }

    fn id<'a>(&self, row: &'a Material) -> &'a EntityId {
        &row.id
    }

    fn row(&self, row: &Material, short_id: String) -> TableRow {
        let m = &row.fields;
        TableRow::new(row.id.to_string(), short_id)
            .cell("drawing", CellValue::text(&m.drawing_no))
            .cell("mark", CellValue::text(&m.mark_no))
            .cell("spec", CellValue::text(&m.mark_spec))
            .cell("material", CellValue::text(&m.material_spec))
            .cell("qty", CellValue::Number(m.quantity))
            .cell("weight", CellValue::Float(m.total_weight, 2))
            .cell("area", CellValue::Float(m.total_area, 2))
            .cell("heat", CellValue::text(&m.heat_no))
            .cell("assembly", CellValue::text(&m.assembly_mark))
            .cell("paint", CellValue::text(&m.paint_system))
    }

    fn search_fields<'a>(&self, row: &'a Material) -> Vec<&'a str> {
        text_fields(&row.fields).to_vec()
    }

    fn matches(&self, row: &Material, search: &str) -> bool {
        self.filter.matches(&row.fields, search)
    }

    fn stats(&self, rows: &[Material]) -> Vec<StatCard> {
        let quantity: i64 = rows.iter().map(|m| m.fields.quantity).sum();
        let weight: f64 = rows.iter().map(|m| m.fields.total_weight).sum();
        let area: f64 = rows.iter().map(|m| m.fields.total_area).sum();
        vec![
            StatCard::count("Items", rows.len()),
            StatCard::new("Quantity", quantity.to_string()),
            StatCard::number("Weight", weight, 2, "kg"),
            StatCard::number("Area", area, 2, "m²"),
        ]
    }
}

// ===== Welders =====

pub struct WelderSpec {
    /// Repair rate (percent) below which a welder is in good standing
    pub threshold: f64,
}

const WELDER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 26),
    ColumnDef::new("cert", "CERT", 14),
    ColumnDef::new("score", "SCORE", 7),
    ColumnDef::new("welds", "WELDS", 7),
    ColumnDef::new("repairs", "REPAIRS", 8),
    ColumnDef::new("rate", "REPAIR %", 9),
    ColumnDef::new("standing", "STANDING", 9),
];

impl WelderSpec {
    pub fn standing(&self, row: &WelderSummary) -> Standing {
        Standing::from_repair_rate(row.repair_rate, self.threshold)
    }
}

fn standing_tone(standing: Standing) -> Tone {
    match standing {
        Standing::Pass => Tone::Good,
        Standing::Fail => Tone::Bad,
    }
}

impl ListSpec for WelderSpec {
    type Row = WelderSummary;
    const NAME: &'static str = Welder::NAME;
    const PREFIX: &'static str = "WLD";

    fn columns(&self) -> &'static [ColumnDef] {
        WELDER_COLUMNS
    }

    fn id<'a>(&self, row: &'a WelderSummary) -> &'a EntityId {
        &row.welder.id
    }

    fn row(&self, row: &WelderSummary, short_id: String) -> TableRow {
        let w = &row.welder;
        let standing = self.standing(row);
        let tone = standing_tone(standing);
        let label = match standing {
            Standing::Pass => "PASS",
            Standing::Fail => "FAIL",
        };
        TableRow::new(w.id.to_string(), short_id)
            .cell("name", CellValue::text(&w.name))
            .cell("cert", CellValue::text(&w.cert_id))
            .cell("score", CellValue::Float(w.score, 1))
            .cell("welds", CellValue::count(row.total_welds))
            .cell("repairs", CellValue::count(row.repairs))
            .cell("rate", CellValue::Percent(row.repair_rate, tone))
            .cell("standing", CellValue::status(label, tone))
    }

    fn search_fields<'a>(&self, row: &'a WelderSummary) -> Vec<&'a str> {
        vec![&row.welder.name, &row.welder.cert_id]
    }

    fn stats(&self, rows: &[WelderSummary]) -> Vec<StatCard> {
        let good = rows
            .iter()
            .filter(|r| self.standing(r) == Standing::Pass)
            .count();
        let avg_score = ratio(rows.iter().map(|r| r.welder.score).sum(), rows.len());
        let avg_rate = ratio(rows.iter().map(|r| r.repair_rate).sum(), rows.len());
        vec![
            StatCard::count("Welders", rows.len()),
            StatCard::number("Avg score", avg_score, 1, ""),
            StatCard::percent("Avg repair rate", avg_rate).tone(standing_tone(
                Standing::from_repair_rate(avg_rate, self.threshold),
            )),
            StatCard::count(format!("Under {}%", self.threshold), good),
        ]
    }

    fn record(&self, row: &WelderSummary) -> JsonValue {
        let mut value = serde_json::to_value(row).unwrap_or(JsonValue::Null);
        if let JsonValue::Object(map) = &mut value {
            let standing = serde_json::to_value(self.standing(row)).unwrap_or(JsonValue::Null);
            map.insert("standing".to_string(), standing);
        }
        value
    }
}

// ===== Inspectors =====

pub struct InspectorSpec;

const INSPECTOR_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 26),
    ColumnDef::new("role", "ROLE", 16),
    ColumnDef::new("email", "EMAIL", 28),
    ColumnDef::new("cert", "CERTIFICATION", 16),
    ColumnDef::new("status", "STATUS", 9),
];

impl ListSpec for InspectorSpec {
    type Row = Inspector;
    const NAME: &'static str = Inspector::NAME;
    const PREFIX: &'static str = "QCI";

    fn columns(&self) -> &'static [ColumnDef] {
        INSPECTOR_COLUMNS
    }

    fn id<'a>(&self, row: &'a Inspector) -> &'a EntityId {
        &row.id
    }

    fn row(&self, row: &Inspector, short_id: String) -> TableRow {
        let tone = match row.status {
            InspectorStatus::Active => Tone::Good,
            InspectorStatus::Inactive => Tone::Neutral,
        };
        TableRow::new(row.id.to_string(), short_id)
            .cell("name", CellValue::text(&row.name))
            .cell("role", CellValue::text(&row.role))
            .cell("email", CellValue::opt(row.email.as_deref()))
            .cell("cert", CellValue::opt(row.certification.as_deref()))
            .cell("status", CellValue::status(row.status, tone))
    }

    fn search_fields<'a>(&self, row: &'a Inspector) -> Vec<&'a str> {
        vec![&row.name, &row.role, opt(&row.email), opt(&row.certification)]
    }

    fn stats(&self, rows: &[Inspector]) -> Vec<StatCard> {
        let active = rows
            .iter()
            .filter(|i| i.status == InspectorStatus::Active)
            .count();
        let certified = rows
            .iter()
            .filter(|i| i.certification.as_deref().is_some_and(|c| !c.trim().is_empty()))
            .count();
        vec![
            StatCard::count("Inspectors", rows.len()),
            StatCard::count("Active", active),
            StatCard::count("Certified", certified),
        ]
    }
}

// ===== WPS =====

pub struct WpsSpec;

const WPS_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "WPS NO", 16),
    ColumnDef::new("process", "PROCESS", 8),
    ColumnDef::new("filler", "FILLER", 16),
    ColumnDef::new("position", "POSITION", 10),
    ColumnDef::new("status", "STATUS", 9),
];

impl ListSpec for WpsSpec {
    type Row = Wps;
    const NAME: &'static str = Wps::NAME;
    const PREFIX: &'static str = "WPS";

    fn columns(&self) -> &'static [ColumnDef] {
        WPS_COLUMNS
    }

    fn id<'a>(&self, row: &'a Wps) -> &'a EntityId {
        &row.id
    }

    fn row(&self, row: &Wps, short_id: String) -> TableRow {
        let tone = match row.status {
            WpsStatus::Approved => Tone::Good,
            WpsStatus::Pending => Tone::Warn,
        };
        TableRow::new(row.id.to_string(), short_id)
            .cell("number", CellValue::text(&row.number))
            .cell("process", CellValue::text(row.process.to_string()))
            .cell("filler", CellValue::text(&row.filler_metal))
            .cell("position", CellValue::text(&row.position))
            .cell("status", CellValue::status(row.status, tone))
    }

    fn search_fields<'a>(&self, row: &'a Wps) -> Vec<&'a str> {
        vec![&row.number, &row.filler_metal, &row.position]
    }

    fn stats(&self, rows: &[Wps]) -> Vec<StatCard> {
        let approved = rows
            .iter()
            .filter(|w| w.status == WpsStatus::Approved)
            .count();
        vec![
            StatCard::count("Procedures", rows.len()),
            StatCard::count("Approved", approved),
            StatCard::count("Pending", rows.len() - approved).tone(if approved < rows.len() {
                Tone::Warn
            } else {
                Tone::Neutral
            }),
        ]
    }
}

// ===== Drawings =====

pub struct DrawingSpec;

const DRAWING_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "DRAWING NO", 18),
    ColumnDef::new("title", "TITLE", 34),
    ColumnDef::new("rev", "REV", 5),
    ColumnDef::new("created", "CREATED", 12),
];

impl ListSpec for DrawingSpec {
    type Row = Drawing;
    const NAME: &'static str = Drawing::NAME;
    const PREFIX: &'static str = "DWG";

    fn columns(&self) -> &'static [ColumnDef] {
        DRAWING_COLUMNS
    }

    fn id<'a>(&self, row: &'a Drawing) -> &'a EntityId {
        &row.id
    }

    fn row(&self, row: &Drawing, short_id: String) -> TableRow {
        TableRow::new(row.id.to_string(), short_id)
            .cell("number", CellValue::text(&row.number))
            .cell("title", CellValue::text(&row.title))
            .cell("rev", CellValue::Number(i64::from(row.revision)))
            .cell("created", CellValue::Date(row.created))
    }

    fn search_fields<'a>(&self, row: &'a Drawing) -> Vec<&'a str> {
        vec![&row.number, &row.title]
    }

    fn stats(&self, rows: &[Drawing]) -> Vec<StatCard> {
        let revised = rows.iter().filter(|d| d.revision > 0).count();
        vec![
            StatCard::count("Drawings", rows.len()),
            StatCard::count("Revised", revised),
        ]
    }
}

// ===== ITPs =====

pub struct ItpSpec;

const ITP_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("title", "TITLE", 34),
    ColumnDef::new("project", "PROJECT", 24),
    ColumnDef::new("status", "STATUS", 9),
    ColumnDef::new("items", "ITEMS", 6),
    ColumnDef::new("holds", "HOLDS", 6),
    ColumnDef::new("evidence", "FILES", 6),
];

fn itp_tone(status: ItpStatus) -> Tone {
    match status {
        ItpStatus::Draft => Tone::Neutral,
        ItpStatus::Issued => Tone::Warn,
        ItpStatus::Approved => Tone::Good,
    }
}

impl ListSpec for ItpSpec {
    type Row = ItpSummary;
    const NAME: &'static str = Itp::NAME;
    const PREFIX: &'static str = "ITP";

    fn columns(&self) -> &'static [ColumnDef] {
        ITP_COLUMNS
    }

    fn id<'a>(&self, row: &'a ItpSummary) -> &'a EntityId {
        &row.itp.id
    }

    fn row(&self, row: &ItpSummary, short_id: String) -> TableRow {
        TableRow::new(row.itp.id.to_string(), short_id)
            .cell("title", CellValue::text(&row.itp.title))
            .cell("project", CellValue::opt(row.project_name.as_deref()))
            .cell("status", CellValue::status(row.itp.status, itp_tone(row.itp.status)))
            .cell("items", CellValue::count(row.item_count))
            .cell("holds", CellValue::count(row.hold_points))
            .cell("evidence", CellValue::count(row.evidence_count))
    }

    fn search_fields<'a>(&self, row: &'a ItpSummary) -> Vec<&'a str> {
        vec![&row.itp.title, opt(&row.project_name)]
    }

    fn stats(&self, rows: &[ItpSummary]) -> Vec<StatCard> {
        let count = |status: ItpStatus| rows.iter().filter(|r| r.itp.status == status).count();
        let approved = count(ItpStatus::Approved);
        vec![
            StatCard::count("ITPs", rows.len()),
            StatCard::count("Draft", count(ItpStatus::Draft)),
            StatCard::count("Issued", count(ItpStatus::Issued)),
            StatCard::count("Approved", approved),
            StatCard::percent("Approval rate", percentage(approved, rows.len())),
        ]
    }
}

// ===== Inspections =====

pub struct InspectionSpec;

const INSPECTION_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("project", "PROJECT", 24),
    ColumnDef::new("inspector", "INSPECTOR", 20),
    ColumnDef::new("result", "RESULT", 8),
    ColumnDef::new("ncrs", "NCRS", 5),
    ColumnDef::new("notes", "NOTES", 30),
];

fn inspection_tone(result: InspectionResult) -> Tone {
    match result {
        InspectionResult::Pass => Tone::Good,
        InspectionResult::Fail => Tone::Bad,
        InspectionResult::Pending => Tone::Warn,
    }
}

impl ListSpec for InspectionSpec {
    type Row = InspectionSummary;
    const NAME: &'static str = Inspection::NAME;
    const PREFIX: &'static str = "INS";

    fn columns(&self) -> &'static [ColumnDef] {
        INSPECTION_COLUMNS
    }

    fn id<'a>(&self, row: &'a InspectionSummary) -> &'a EntityId {
        &row.inspection.id
    }

    fn row(&self, row: &InspectionSummary, short_id: String) -> TableRow {
        let i = &row.inspection;
        TableRow::new(i.id.to_string(), short_id)
            .cell("date", CellValue::Day(i.inspected_on))
            .cell("project", CellValue::opt(row.project_name.as_deref()))
            .cell("inspector", CellValue::opt(row.inspector_name.as_deref()))
            .cell("result", CellValue::status(i.result, inspection_tone(i.result)))
            .cell("ncrs", CellValue::count(row.ncr_count))
            .cell("notes", CellValue::text(&i.notes))
    }

    fn search_fields<'a>(&self, row: &'a InspectionSummary) -> Vec<&'a str> {
        vec![
            &row.inspection.notes,
            opt(&row.project_name),
            opt(&row.inspector_name),
        ]
    }

    fn stats(&self, rows: &[InspectionSummary]) -> Vec<StatCard> {
        let count = |r: InspectionResult| rows.iter().filter(|s| s.inspection.result == r).count();
        let failed = count(InspectionResult::Fail);
        vec![
            StatCard::count("Inspections", rows.len()),
            StatCard::percent("Pass rate", percentage(count(InspectionResult::Pass), rows.len())),
            StatCard::count("Failed", failed).alert_if_nonzero(failed),
            StatCard::count("Pending", count(InspectionResult::Pending)),
        ]
    }
}

// ===== NCRs =====

pub struct NcrSpec;

const NCR_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("number", "NCR NO", 15),
    ColumnDef::new("status", "STATUS", 12),
    ColumnDef::new("description", "DESCRIPTION", 34),
    ColumnDef::new("project", "PROJECT", 20),
    ColumnDef::new("material", "MARK", 10),
    ColumnDef::new("age", "AGE (D)", 8),
    ColumnDef::new("evidence", "FILES", 6),
];

pub fn ncr_tone(status: NcrStatus) -> Tone {
    match status {
        NcrStatus::Open => Tone::Bad,
        NcrStatus::OnProgress => Tone::Warn,
        NcrStatus::Closed => Tone::Good,
    }
}

impl ListSpec for NcrSpec {
    type Row = NcrSummary;
    const NAME: &'static str = Ncr::NAME;
    const PREFIX: &'static str = "NCR";

    fn columns(&self) -> &'static [ColumnDef] {
        NCR_COLUMNS
    }

    fn id<'a>(&self, row: &'a NcrSummary) -> &'a EntityId {
        &row.ncr.id
    }

    fn row(&self, row: &NcrSummary, short_id: String) -> TableRow {
        let n = &row.ncr;
        TableRow::new(n.id.to_string(), short_id)
            .cell("number", CellValue::text(&n.ncr_number))
            .cell("status", CellValue::status(n.status, ncr_tone(n.status)))
            .cell("description", CellValue::text(&n.description))
            .cell("project", CellValue::opt(row.project_name.as_deref()))
            .cell("material", CellValue::opt(row.material_mark.as_deref()))
            .cell("age", CellValue::Number(n.age_days()))
            .cell("evidence", CellValue::count(row.evidence_count))
    }

    fn search_fields<'a>(&self, row: &'a NcrSummary) -> Vec<&'a str> {
        vec![
            &row.ncr.ncr_number,
            &row.ncr.description,
            &row.ncr.root_cause,
            opt(&row.project_name),
            opt(&row.material_mark),
        ]
    }

    fn stats(&self, rows: &[NcrSummary]) -> Vec<StatCard> {
        let count = |s: NcrStatus| rows.iter().filter(|r| r.ncr.status == s).count();
        let open = count(NcrStatus::Open);
        let closed = count(NcrStatus::Closed);
        vec![
            StatCard::count("NCRs", rows.len()),
            StatCard::count("Open", open).alert_if_nonzero(open),
            StatCard::count("On progress", count(NcrStatus::OnProgress)),
            StatCard::count("Closed", closed),
            StatCard::percent("Closure rate", percentage(closed, rows.len())),
        ]
    }
}

// ===== MDR reports =====

/// Reports of one discipline
pub struct MdrSpec {
    pub discipline: Discipline,
    /// Welder names by full ID, for welding reports
    pub welder_names: HashMap<String, String>,
    /// Repair rate (percent) at which welding repairs are flagged
    pub repair_threshold: f64,
}

const MDR_COMMON: [ColumnDef; 4] = [
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("project", "PROJECT", 18),
    ColumnDef::new("inspector", "INSPECTOR", 16),
    ColumnDef::new("status", "STATUS", 8),
];

const CUTTING_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("drawing", "DRAWING", 14),
    ColumnDef::new("mark", "MARK", 10),
    ColumnDef::new("material", "MATERIAL", 12),
    ColumnDef::new("heat", "HEAT", 12),
    ColumnDef::new("qty", "QTY", 6),
    ColumnDef::new("length", "LENGTH", 9),
    MDR_COMMON[3],
];

const FITUP_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("joint", "JOINT", 10),
    ColumnDef::new("drawing", "DRAWING", 14),
    ColumnDef::new("parts", "PARTS", 16),
    ColumnDef::new("gap", "GAP", 6),
    ColumnDef::new("bevel", "BEVEL", 6),
    MDR_COMMON[3],
];

const NDT_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("joint", "JOINT", 10),
    ColumnDef::new("method", "METHOD", 7),
    ColumnDef::new("spec", "SPEC", 14),
    ColumnDef::new("defects", "DEFECTS", 20),
    MDR_COMMON[3],
];

const PAINTING_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("area", "AREA", 14),
    ColumnDef::new("system", "SYSTEM", 12),
    ColumnDef::new("coat", "COAT", 10),
    ColumnDef::new("temp", "TEMP", 6),
    ColumnDef::new("humidity", "RH %", 6),
    ColumnDef::new("dft", "DFT", 6),
    MDR_COMMON[3],
];

const WELDING_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("joint", "JOINT", 10),
    ColumnDef::new("drawing", "DRAWING", 14),
    ColumnDef::new("welder", "WELDER", 18),
    ColumnDef::new("wps", "WPS", 12),
    ColumnDef::new("position", "POS", 6),
    ColumnDef::new("length", "LENGTH", 8),
    MDR_COMMON[3],
];

const INCOMING_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("item", "ITEM", 18),
    ColumnDef::new("supplier", "SUPPLIER", 16),
    ColumnDef::new("po", "PO", 10),
    ColumnDef::new("heat", "HEAT", 12),
    ColumnDef::new("cert", "CERT", 12),
    ColumnDef::new("qty", "QTY", 6),
    MDR_COMMON[3],
];

const FINAL_COLUMNS: &[ColumnDef] = &[
    MDR_COMMON[0],
    MDR_COMMON[1],
    MDR_COMMON[2],
    ColumnDef::new("item", "ITEM", 20),
    ColumnDef::new("drawing", "DRAWING", 14),
    ColumnDef::new("dimensions", "DIM", 4),
    ColumnDef::new("visual", "VIS", 4),
    MDR_COMMON[3],
];

impl MdrSpec {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            welder_names: HashMap::new(),
            repair_threshold: crate::entities::welder::DEFAULT_REPAIR_RATE_THRESHOLD,
        }
    }

    fn welder_name<'a>(&'a self, welder_id: &'a str) -> &'a str {
        self.welder_names
            .get(welder_id.trim())
            .map(String::as_str)
            .unwrap_or(welder_id)
    }

    fn payload_cells(&self, row: TableRow, payload: &MdrPayload) -> TableRow {
        match payload {
            MdrPayload::Cutting(d) => row
                .cell("drawing", CellValue::text(&d.drawing_no))
                .cell("mark", CellValue::text(&d.mark_no))
                .cell("material", CellValue::text(&d.material))
                .cell("heat", CellValue::text(&d.heat_no))
                .cell("qty", CellValue::Number(d.quantity))
                .cell("length", CellValue::Float(d.length, 1)),
            MdrPayload::Fitup(d) => row
                .cell("joint", CellValue::text(&d.joint_no))
                .cell("drawing", CellValue::text(&d.drawing_no))
                .cell("parts", CellValue::text(&d.parts))
                .cell("gap", CellValue::Float(d.gap, 1))
                .cell("bevel", CellValue::Float(d.bevel_angle, 0)),
            MdrPayload::Ndt(d) => row
                .cell("joint", CellValue::text(&d.joint_no))
                .cell("method", CellValue::text(&d.method))
                .cell("spec", CellValue::text(&d.spec))
                .cell("defects", CellValue::text(&d.defects)),
            MdrPayload::Painting(d) => row
                .cell("area", CellValue::text(&d.area))
                .cell("system", CellValue::text(&d.system))
                .cell("coat", CellValue::text(&d.coat))
                .cell("temp", CellValue::Float(d.temp, 1))
                .cell(
                    "humidity",
                    CellValue::Percent(
                        d.humidity,
                        if d.humidity > HUMIDITY_LIMIT { Tone::Bad } else { Tone::Neutral },
                    ),
                )
                .cell("dft", CellValue::Float(d.thickness, 0)),
            MdrPayload::Welding(d) => row
                .cell("joint", CellValue::text(&d.joint_no))
                .cell("drawing", CellValue::text(&d.drawing_no))
                .cell("welder", CellValue::text(self.welder_name(&d.welder_id)))
                .cell("wps", CellValue::text(&d.wps_no))
                .cell("position", CellValue::text(&d.position))
                .cell("length", CellValue::Float(d.length, 0)),
            MdrPayload::Incoming(d) => row
                .cell("item", CellValue::text(&d.item))
                .cell("supplier", CellValue::text(&d.supplier))
                .cell("po", CellValue::text(&d.po_no))
                .cell("heat", CellValue::text(&d.heat_no))
                .cell("cert", CellValue::text(&d.cert_no))
                .cell("qty", CellValue::Number(d.quantity)),
            MdrPayload::Final(d) => row
                .cell("item", CellValue::text(&d.item))
                .cell("drawing", CellValue::text(&d.drawing_no))
                .cell("dimensions", CellValue::Flag(d.dimensions_ok))
                .cell("visual", CellValue::Flag(d.visual_ok)),
        }
    }
}

/// Relative humidity (percent) above which painting is flagged
pub const HUMIDITY_LIMIT: f64 = 85.0;

fn reports<'a>(rows: &'a [MdrSummary]) -> impl Iterator<Item = &'a MdrReport> + 'a {
    rows.iter().map(|r| &r.report)
}

impl ListSpec for MdrSpec {
    type Row = MdrSummary;
    const NAME: &'static str = MdrReport::NAME;
    const PREFIX: &'static str = "MDR";

    fn columns(&self) -> &'static [ColumnDef] {
        match self.discipline {
            Discipline::Cutting => CUTTING_COLUMNS,
            Discipline::Fitup => FITUP_COLUMNS,
            Discipline::Ndt => NDT_COLUMNS,
            Discipline::Painting => PAINTING_COLUMNS,
            Discipline::Welding => WELDING_COLUMNS,
            Discipline::Incoming => INCOMING_COLUMNS,
            Discipline::Final => FINAL_COLUMNS,
        }
    }

    fn id<'a>(&self, row: &'a MdrSummary) -> &'a EntityId {
        &row.report.id
    }

    fn row(&self, row: &MdrSummary, short_id: String) -> TableRow {
        let r = &row.report;
        let mut table_row = TableRow::new(r.id.to_string(), short_id)
            .cell("date", CellValue::Date(r.created))
            .cell("project", CellValue::opt(row.project_name.as_deref()))
            .cell("inspector", CellValue::opt(row.inspector_name.as_deref()))
            .cell(
                "status",
                CellValue::status(r.status, tone_for_outcome(r.status.outcome())),
            );
        if r.is_malformed() {
            table_row = table_row.flagged("!");
        }
        self.payload_cells(table_row, &r.data)
    }

    fn search_fields<'a>(&self, row: &'a MdrSummary) -> Vec<&'a str> {
        let mut fields = vec![opt(&row.project_name), opt(&row.inspector_name)];
        let payload = match &row.report.data {
            MdrPayload::Cutting(d) => vec![&d.drawing_no, &d.mark_no, &d.heat_no, &d.remarks],
            MdrPayload::Fitup(d) => vec![&d.joint_no, &d.drawing_no, &d.parts, &d.remarks],
            MdrPayload::Ndt(d) => vec![&d.joint_no, &d.method, &d.defects, &d.remarks],
            MdrPayload::Painting(d) => vec![&d.area, &d.system, &d.coat, &d.remarks],
            MdrPayload::Welding(d) => vec![&d.joint_no, &d.drawing_no, &d.wps_no, &d.remarks],
            MdrPayload::Incoming(d) => vec![&d.item, &d.supplier, &d.po_no, &d.heat_no],
            MdrPayload::Final(d) => vec![&d.item, &d.drawing_no, &d.remarks],
        };
        fields.extend(payload.into_iter().map(String::as_str));
        fields
    }

    fn matches(&self, row: &MdrSummary, search: &str) -> bool {
        if matches_any(&self.search_fields(row), search) {
            return true;
        }
        match &row.report.data {
            MdrPayload::Welding(d) => matches_any(&[self.welder_name(&d.welder_id)], search),
            _ => false,
        }
    }

    fn stats(&self, rows: &[MdrSummary]) -> Vec<StatCard> {
        let total = rows.len();
        let outcome = |o: Outcome| reports(rows).filter(|r| r.status.outcome() == o).count();
        let passed = outcome(Outcome::Passed);
        let failed = outcome(Outcome::Failed);

        let mut cards = vec![
            StatCard::count("Reports", total),
            StatCard::count("Open", outcome(Outcome::Open)),
        ];

        match self.discipline {
            Discipline::Cutting => {
                let qty: i64 = reports(rows)
                    .map(|r| match &r.data {
                        MdrPayload::Cutting(d) => d.quantity,
                        _ => 0,
                    })
                    .sum();
                cards.push(StatCard::new("Total qty", qty.to_string()));
                cards.push(StatCard::count("Rejected", failed).alert_if_nonzero(failed));
            }
            Discipline::Fitup => {
                let gaps: f64 = reports(rows)
                    .map(|r| match &r.data {
                        MdrPayload::Fitup(d) => d.gap,
                        _ => 0.0,
                    })
                    .sum();
                cards.push(StatCard::number("Avg gap", ratio(gaps, total), 2, "mm"));
                cards.push(StatCard::count("Rejected", failed).alert_if_nonzero(failed));
            }
            Discipline::Ndt => {
                cards.push(StatCard::percent("Pass rate", percentage(passed, total)));
                cards.push(StatCard::count("Rejects", failed).alert_if_nonzero(failed));
            }
            Discipline::Painting => {
                let mut dft = 0.0;
                let mut humid = 0;
                for report in reports(rows) {
                    if let MdrPayload::Painting(d) = &report.data {
                        dft += d.thickness;
                        if d.humidity > HUMIDITY_LIMIT {
                            humid += 1;
                        }
                    }
                }
                cards.push(StatCard::number("Avg DFT", ratio(dft, total), 0, "µm"));
                cards.push(
                    StatCard::count(format!("RH > {}%", HUMIDITY_LIMIT), humid).alert_if_nonzero(humid),
                );
            }
            Discipline::Welding => {
                let rate = percentage(failed, total);
                let tone = if rate < self.repair_threshold { Tone::Good } else { Tone::Bad };
                cards.push(StatCard::percent("Repair rate", rate).tone(if total == 0 {
                    Tone::Neutral
                } else {
                    tone
                }));
                cards.push(StatCard::count("Repairs", failed));
            }
            Discipline::Incoming => {
                let qty: i64 = reports(rows)
                    .map(|r| match &r.data {
                        MdrPayload::Incoming(d) => d.quantity,
                        _ => 0,
                    })
                    .sum();
                cards.push(StatCard::new("Total qty", qty.to_string()));
                cards.push(StatCard::count("Rejected", failed).alert_if_nonzero(failed));
            }
            Discipline::Final => {
                cards.push(StatCard::percent("Pass rate", percentage(passed, total)));
                cards.push(StatCard::count("On hold", outcome(Outcome::Open)));
            }
        }

        let malformed = reports(rows).filter(|r| r.is_malformed()).count();
        if malformed > 0 {
            cards.push(StatCard::count("Unreadable", malformed).tone(Tone::Bad));
        }
        cards
    }
}

/// Look up the name of every welder, keyed by full ID
pub fn welder_names(welders: &[WelderSummary]) -> HashMap<String, String> {
    welders
        .iter()
        .map(|w| (w.welder.id.to_string(), w.welder.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::entities::{MaterialFields, ReportStatus};
    use crate::views::FilterRow;

    fn welder(rate: f64) -> WelderSummary {
        WelderSummary {
            welder: Welder::new("W".to_string(), "C-1".to_string()),
            total_welds: 100,
            repairs: rate as usize,
            repair_rate: rate,
        }
    }

    fn summary(report: MdrReport) -> MdrSummary {
        MdrSummary {
            report,
            project_name: Some("Tank farm".to_string()),
            inspector_name: None,
        }
    }

    fn report(payload: MdrPayload, status: ReportStatus) -> MdrReport {
        let mut r = MdrReport::new(
            payload,
            EntityId::new(EntityPrefix::Prj),
            EntityId::new(EntityPrefix::Qci),
        );
        r.status = status;
        r
    }

    #[test]
    fn test_welder_standing_follows_threshold() {
        let spec = WelderSpec { threshold: 5.0 };
        let low = welder(3.0);
        let high = welder(8.0);
        assert_eq!(spec.standing(&low), Standing::Pass);
        assert_eq!(spec.standing(&high), Standing::Fail);

        let row = spec.row(&low, "WLD@1".to_string());
        assert!(matches!(row.get("standing"), Some(CellValue::Status(s, Tone::Good)) if s == "PASS"));
        let row = spec.row(&high, "WLD@2".to_string());
        assert!(matches!(row.get("standing"), Some(CellValue::Status(s, Tone::Bad)) if s == "FAIL"));

        assert_eq!(spec.record(&high)["standing"], "fail");
    }

    #[test]
    fn test_empty_collections_have_zero_rates() {
        let ncr = NcrSpec.stats(&[]);
        assert!(ncr.iter().any(|c| c.label == "Closure rate" && c.value == "0.0%"));

        let welders = WelderSpec { threshold: 5.0 }.stats(&[]);
        assert!(welders.iter().any(|c| c.label == "Avg repair rate" && c.value == "0.0%"));

        for d in Discipline::all() {
            let cards = MdrSpec::new(*d).stats(&[]);
            assert!(cards.iter().all(|c| !c.value.contains("NaN")), "{} stats", d);
        }
    }

    #[test]
    fn test_painting_stats() {
        let paint = |thickness: &str, humidity: &str| {
            let mut p = MdrPayload::empty(Discipline::Painting);
            p.set_field("thickness", thickness).unwrap();
            p.set_field("humidity", humidity).unwrap();
            summary(report(p, ReportStatus::Pass))
        };
        let rows = vec![paint("80", "60"), paint("120", "90")];
        let cards = MdrSpec::new(Discipline::Painting).stats(&rows);
        assert!(cards.iter().any(|c| c.label == "Avg DFT" && c.value == "100 µm"));
        assert!(cards
            .iter()
            .any(|c| c.label == "RH > 85%" && c.value == "1" && c.tone == Tone::Bad));
    }

    #[test]
    fn test_ndt_pass_rate() {
        let rows = vec![
            summary(report(MdrPayload::empty(Discipline::Ndt), ReportStatus::Pass)),
            summary(report(MdrPayload::empty(Discipline::Ndt), ReportStatus::Fail)),
        ];
        let cards = MdrSpec::new(Discipline::Ndt).stats(&rows);
        assert!(cards.iter().any(|c| c.label == "Pass rate" && c.value == "50.0%"));
        assert!(cards.iter().any(|c| c.label == "Rejects" && c.tone == Tone::Bad));
    }

    #[test]
    fn test_malformed_report_is_flagged() {
        let (payload, integrity) = MdrPayload::decode(Discipline::Fitup, "{oops");
        let mut r = report(payload, ReportStatus::Pending);
        r.integrity = integrity;
        let spec = MdrSpec::new(Discipline::Fitup);
        let row = spec.row(&summary(r.clone()), "MDR@1".to_string());
        assert_eq!(row.flag, Some("!"));
        assert!(matches!(row.get("gap"), Some(CellValue::Float(g, _)) if *g == 0.0));
        assert!(spec
            .stats(&[summary(r)])
            .iter()
            .any(|c| c.label == "Unreadable"));
    }

    #[test]
    fn test_welding_rows_show_welder_names() {
        let w = welder(0.0);
        let mut payload = MdrPayload::empty(Discipline::Welding);
        payload.set_field("welder_id", &w.welder.id.to_string()).unwrap();
        let mut spec = MdrSpec::new(Discipline::Welding);
        spec.welder_names = welder_names(&[w]);
        let row = spec.row(&summary(report(payload, ReportStatus::Pass)), "MDR@1".to_string());
        assert!(matches!(row.get("welder"), Some(CellValue::Text(name)) if name == "W"));
    }

    #[test]
    fn test_material_spec_uses_filter_rows() {
        let spec = MaterialSpec {
            filter: MaterialFilter::new(vec![FilterRow::parse("heat=H9").unwrap()]),
        };
        let material = |heat: &str| {
            Material::new(MaterialFields {
                mark_no: "B1".to_string(),
                heat_no: heat.to_string(),
                quantity: 1,
                ..Default::default()
            })
        };
        assert!(spec.matches(&material("h9-2"), ""));
        assert!(!spec.matches(&material("H1"), ""));
        assert!(!spec.matches(&material("H9"), "nothing like this"));
        assert!(spec.matches(&material("H9"), "b1"));
        let m = material("H9");
        assert_eq!(spec.search_fields(&m), text_fields(&m.fields).to_vec());
    }
}
