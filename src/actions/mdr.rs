//! MDR report actions

use serde::Serialize;

use crate::actions::{self, ActionError, ActionResult, Created};
use crate::core::identity::EntityId;
use crate::entities::{Discipline, Inspector, MdrPayload, MdrReport, MdrSummary, Project, Welder};
use crate::schema::Validator;
use crate::store::Store;

/// Reports of one discipline, or all of them
pub fn get_reports(store: &Store, discipline: Option<Discipline>) -> ActionResult<Vec<MdrSummary>> {
    Ok(store.mdr_summaries(discipline)?)
}

/// A report with context resolved; `None` when it does not exist
pub fn get_report_detail(store: &Store, id: &EntityId) -> ActionResult<Option<MdrSummary>> {
    let Some(report) = store.get::<MdrReport>(id)? else {
        return Ok(None);
    };
    Ok(store
        .mdr_summaries(Some(report.discipline))?
        .into_iter()
        .find(|s| &s.report.id == id))
}

fn check_report(store: &Store, report: &MdrReport) -> ActionResult<()> {
    if report.data.discipline() != report.discipline {
        return Err(ActionError::rejected(format!(
            "{} payload cannot be stored on a {} report",
            report.data.discipline().label(),
            report.discipline.label()
        )));
    }
    if !report.discipline.allows(report.status) {
        return Err(ActionError::rejected(format!(
            "{} is not a {} status. Use {}",
            report.status,
            report.discipline.label(),
            report.discipline.vocabulary()
        )));
    }
    actions::require::<Project>(store, &report.project_id)?;
    actions::require::<Inspector>(store, &report.inspector_id)?;
    if let MdrPayload::Welding(data) = &report.data {
        if !data.welder_id.trim().is_empty() {
            let welder = EntityId::parse(data.welder_id.trim())
                .map_err(|_| ActionError::rejected(format!("Unknown welder: {}", data.welder_id)))?;
            actions::require::<Welder>(store, &welder)?;
        }
    }
    Ok(())
}

pub fn create_report(store: &Store, report: MdrReport) -> ActionResult<Created<MdrReport>> {
    check_report(store, &report)?;
    actions::insert(store, report)
}

pub fn update_report(store: &Store, report: &MdrReport) -> ActionResult<()> {
    check_report(store, report)?;
    actions::update(store, report)
}

pub fn delete_report(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<MdrReport>(store, id, || "Report is still referenced".to_string())
}

/// One stored payload that failed decoding or schema validation
#[derive(Debug, Serialize)]
pub struct IntegrityIssue {
    pub id: EntityId,
    pub short_id: String,
    pub discipline: Discipline,
    /// The payload decoded to defaults
    pub malformed: bool,
    pub messages: Vec<String>,
    #[serde(skip)]
    pub diagnostic: Option<crate::schema::ValidationError>,
}

/// Scan every stored payload against its discipline schema
pub fn check_integrity(store: &Store, validator: &Validator) -> ActionResult<(usize, Vec<IntegrityIssue>)> {
    let mut stmt = store
        .conn()
        .prepare("SELECT id, discipline, data FROM mdr_reports ORDER BY created")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, EntityId>(0)?,
                row.get::<_, Discipline>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let scanned = rows.len();
    let mut issues = Vec::new();
    for (id, discipline, raw) in rows {
        let raw = raw.unwrap_or_default();
        let short_id = store.display_id(&id)?;
        let (_, integrity) = MdrPayload::decode(discipline, &raw);
        if let Err(diagnostic) = validator.validate(&raw, &short_id, discipline) {
            issues.push(IntegrityIssue {
                id,
                short_id,
                discipline,
                malformed: integrity == crate::entities::Integrity::Malformed,
                messages: diagnostic.messages(),
                diagnostic: Some(diagnostic),
            });
        }
    }
    tracing::debug!(scanned, issues = issues.len(), "MDR integrity scan finished");
    Ok((scanned, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Client, ReportStatus};

    fn seeded() -> (Store, Project, Inspector) {
        let store = Store::open_in_memory().unwrap();
        let client = Client::new("Acme".to_string());
        store.insert(&client).unwrap();
        let project = Project::new("Tank farm".to_string(), client.id.clone());
        store.insert(&project).unwrap();
        let inspector = Inspector::new("R. Chen".to_string(), "QC".to_string());
        store.insert(&inspector).unwrap();
        (store, project, inspector)
    }

    #[test]
    fn test_status_outside_vocabulary_is_rejected() {
        let (store, project, inspector) = seeded();
        let mut report = MdrReport::new(
            MdrPayload::empty(Discipline::Ndt),
            project.id.clone(),
            inspector.id.clone(),
        );
        report.status = ReportStatus::Reject;
        let err = create_report(&store, report.clone()).unwrap_err();
        assert_eq!(
            err.user_message(),
            "REJECT is not a NDT status. Use PASS/FAIL/PENDING"
        );

        report.status = ReportStatus::Fail;
        assert!(create_report(&store, report).is_ok());
    }

    #[test]
    fn test_unknown_welder_is_rejected() {
        let (store, project, inspector) = seeded();
        let mut payload = MdrPayload::empty(Discipline::Welding);
        payload.set_field("welder_id", "not-an-id").unwrap();
        let report = MdrReport::new(payload, project.id, inspector.id);
        assert!(matches!(
            create_report(&store, report),
            Err(ActionError::Rejected(_))
        ));
    }

    #[test]
    fn test_reports_filtered_by_discipline() {
        let (store, project, inspector) = seeded();
        for d in [Discipline::Cutting, Discipline::Cutting, Discipline::Final] {
            let report = MdrReport::new(MdrPayload::empty(d), project.id.clone(), inspector.id.clone());
            create_report(&store, report).unwrap();
        }
        assert_eq!(get_reports(&store, Some(Discipline::Cutting)).unwrap().len(), 2);
        assert_eq!(get_reports(&store, None).unwrap().len(), 3);
    }

    #[test]
    fn test_integrity_scan_finds_broken_payloads() {
        let (store, project, inspector) = seeded();
        let mut payload = MdrPayload::empty(Discipline::Painting);
        payload.set_field("area", "Deck").unwrap();
        let good = MdrReport::new(payload, project.id.clone(), inspector.id.clone());
        create_report(&store, good).unwrap();

        let broken = MdrReport::new(
            MdrPayload::empty(Discipline::Painting),
            project.id.clone(),
            inspector.id.clone(),
        );
        let broken_id = create_report(&store, broken).unwrap().record.id;
        store
            .conn()
            .execute(
                "UPDATE mdr_reports SET data = '{oops' WHERE id = ?1",
                [&broken_id],
            )
            .unwrap();

        let (scanned, issues) = check_integrity(&store, &Validator::default()).unwrap();
        assert_eq!(scanned, 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, broken_id);
        assert!(issues[0].malformed);
    }

    fn stored_data(store: &Store, id: &EntityId) -> String {
        store
            .conn()
            .query_row("SELECT data FROM mdr_reports WHERE id = ?1", [id], |row| row.get(0))
            .unwrap()
    }

    fn seed_unreadable(
        store: &Store,
        project: &Project,
        inspector: &Inspector,
        raw: &str,
    ) -> EntityId {
        let report = MdrReport::new(
            MdrPayload::empty(Discipline::Painting),
            project.id.clone(),
            inspector.id.clone(),
        );
        let id = create_report(store, report).unwrap().record.id;
        store
            .conn()
            .execute(
                "UPDATE mdr_reports SET data = ?1 WHERE id = ?2",
                rusqlite::params![raw, &id],
            )
            .unwrap();
        id
    }

    #[test]
    fn test_status_edit_keeps_unreadable_payload() {
        use crate::views::forms::MdrForm;
        use crate::views::Form;

        let (store, project, inspector) = seeded();
        let raw = r#"{"area":"Deck","thickness":125,"#;
        let id = seed_unreadable(&store, &project, &inspector, raw);

        let mut report: MdrReport = store.get(&id).unwrap().unwrap();
        assert!(report.is_malformed());
        let mut form = MdrForm::from_record(&report);
        form.status = ReportStatus::Pass;
        form.apply(&mut report);
        update_report(&store, &report).unwrap();

        assert_eq!(stored_data(&store, &id), raw);
        let reread: MdrReport = store.get(&id).unwrap().unwrap();
        assert!(reread.is_malformed());
        assert_eq!(reread.status, ReportStatus::Pass);
        let (_, issues) = check_integrity(&store, &Validator::default()).unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_payload_edit_replaces_unreadable_payload() {
        use crate::views::forms::MdrForm;
        use crate::views::Form;

        let (store, project, inspector) = seeded();
        let id = seed_unreadable(&store, &project, &inspector, "{oops");

        let mut report: MdrReport = store.get(&id).unwrap().unwrap();
        let mut form = MdrForm::from_record(&report);
        form.payload.set_field("area", "Hull").unwrap();
        form.apply(&mut report);
        update_report(&store, &report).unwrap();

        let reread: MdrReport = store.get(&id).unwrap().unwrap();
        assert!(!reread.is_malformed());
        assert_eq!(reread.data.headline(), "Hull");
    }
}
