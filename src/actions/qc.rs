//! Quality-control actions: ITPs, inspections, NCRs and evidence

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::actions::{self, ActionError, ActionResult, Created};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::ncr::next_ncr_number;
use crate::entities::{
    Evidence, Inspection, InspectionResult, InspectionSummary, Inspector, Itp, ItpItem,
    ItpSummary, Material, Ncr, NcrStatus, NcrSummary, Project,
};
use crate::store::Store;

// ===== ITPs =====

/// An ITP with its ordered items and evidence
#[derive(Debug, Clone, Serialize)]
pub struct ItpDetail {
    #[serde(flatten)]
    pub itp: Itp,
    pub project_name: Option<String>,
    pub items: Vec<ItpItem>,
    pub evidence: Vec<Evidence>,
}

pub fn get_itps(store: &Store) -> ActionResult<Vec<ItpSummary>> {
    Ok(store.itp_summaries()?)
}

/// Fetch an ITP with items and evidence; `None` when it does not exist
pub fn get_itp_detail(store: &Store, id: &EntityId) -> ActionResult<Option<ItpDetail>> {
    let Some(itp) = store.get::<Itp>(id)? else {
        return Ok(None);
    };
    let project_name = match &itp.project_id {
        Some(pid) => store.get::<Project>(pid)?.map(|p| p.name),
        None => None,
    };
    Ok(Some(ItpDetail {
        items: store.itp_items(id)?,
        evidence: store.itp_evidence(id)?,
        itp,
        project_name,
    }))
}

fn check_itp(store: &Store, itp: &Itp) -> ActionResult<()> {
    actions::required("ITP title", &itp.title)?;
    if let Some(project_id) = &itp.project_id {
        actions::require::<Project>(store, project_id)?;
    }
    Ok(())
}

pub fn create_itp(store: &Store, itp: Itp) -> ActionResult<Created<Itp>> {
    check_itp(store, &itp)?;
    actions::insert(store, itp)
}

pub fn update_itp(store: &Store, itp: &Itp) -> ActionResult<()> {
    check_itp(store, itp)?;
    actions::update(store, itp)
}

/// Delete an ITP together with its items and evidence references
pub fn delete_itp(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Itp>(store, id, || "ITP is still referenced".to_string())
}

/// Append an item to the end of an ITP
pub fn add_itp_item(store: &Store, mut item: ItpItem) -> ActionResult<Created<ItpItem>> {
    actions::required("Stage", &item.stage)?;
    actions::require::<Itp>(store, &item.itp_id)?;
    store.transaction(|s| {
        item.seq = s.next_item_seq(&item.itp_id)?;
        actions::insert(s, item)
    })
}

pub fn update_itp_item(store: &Store, item: &ItpItem) -> ActionResult<()> {
    actions::required("Stage", &item.stage)?;
    actions::update(store, item)
}

pub fn delete_itp_item(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<ItpItem>(store, id, || "ITP item is still referenced".to_string())
}

// ===== Evidence =====

/// What an evidence reference is attached to
#[derive(Debug, Clone)]
pub enum EvidenceOwner {
    Itp(EntityId),
    Ncr(EntityId),
}

fn sha256_file(path: &Path) -> std::io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        size += n as u64;
        hasher.update(&buf[..n]);
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}

/// Record references to `path` (a file, or every file below a directory)
pub fn attach_evidence(
    store: &Store,
    owner: EvidenceOwner,
    path: &Path,
) -> ActionResult<Vec<Created<Evidence>>> {
    match &owner {
        EvidenceOwner::Itp(id) => actions::require::<Itp>(store, id)?,
        EvidenceOwner::Ncr(id) => actions::require::<Ncr>(store, id)?,
    }
    if !path.exists() {
        return Err(ActionError::rejected(format!(
            "Evidence path does not exist: {}",
            path.display()
        )));
    }

    let files: Vec<_> = if path.is_dir() {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(ActionError::rejected(format!(
            "No files found in {}",
            path.display()
        )));
    }

    let mut prepared = Vec::with_capacity(files.len());
    for file in files {
        let (sha256, size) = sha256_file(&file)?;
        let absolute = file.canonicalize().unwrap_or_else(|_| file.clone());
        prepared.push(Evidence {
            id: EntityId::new(EntityPrefix::Evd),
            itp_id: match &owner {
                EvidenceOwner::Itp(id) => Some(id.clone()),
                EvidenceOwner::Ncr(_) => None,
            },
            ncr_id: match &owner {
                EvidenceOwner::Ncr(id) => Some(id.clone()),
                EvidenceOwner::Itp(_) => None,
            },
            path: absolute.display().to_string(),
            file_name: file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size_bytes: size as i64,
            sha256,
            created: Utc::now(),
        });
    }

    store.transaction(|s| prepared.into_iter().map(|e| actions::insert(s, e)).collect())
}

pub fn delete_evidence(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Evidence>(store, id, || "Evidence is still referenced".to_string())
}

// ===== Inspections =====

pub fn get_inspections(store: &Store) -> ActionResult<Vec<InspectionSummary>> {
    Ok(store.inspection_summaries()?)
}

fn check_inspection(store: &Store, inspection: &Inspection) -> ActionResult<()> {
    actions::require::<Project>(store, &inspection.project_id)?;
    actions::require::<Inspector>(store, &inspection.inspector_id)?;
    if let Some(material_id) = &inspection.material_id {
        actions::require::<Material>(store, material_id)?;
    }
    Ok(())
}

pub fn create_inspection(store: &Store, inspection: Inspection) -> ActionResult<Created<Inspection>> {
    check_inspection(store, &inspection)?;
    actions::insert(store, inspection)
}

/// Delete an inspection and every NCR raised against it
pub fn delete_inspection(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Inspection>(store, id, || "Inspection is still referenced".to_string())
}

// ===== NCRs =====

/// Where the inspection backing a new NCR comes from
#[derive(Debug, Clone)]
pub enum NcrSource {
    /// An inspection that already exists
    Existing(EntityId),
    /// Record a failed inspection first, in the same transaction
    Manual {
        project_id: EntityId,
        inspector_id: EntityId,
    },
}

/// Everything needed to raise an NCR
#[derive(Debug, Clone)]
pub struct NcrRequest {
    /// Explicit number; generated as `NCR-<year>-NNNN` when absent
    pub ncr_number: Option<String>,
    pub description: String,
    pub root_cause: String,
    pub corrective_action: String,
    pub status: NcrStatus,
    pub material_id: Option<EntityId>,
    pub source: NcrSource,
}

/// An NCR with its inspection, evidence and context resolved
#[derive(Debug, Clone, Serialize)]
pub struct NcrDetail {
    #[serde(flatten)]
    pub summary: NcrSummary,
    pub inspection: Option<Inspection>,
    pub evidence: Vec<Evidence>,
}

pub fn get_ncrs(store: &Store) -> ActionResult<Vec<NcrSummary>> {
    Ok(store.ncr_summaries()?)
}

/// Fetch an NCR with context; `None` when it does not exist
pub fn get_ncr_detail(store: &Store, id: &EntityId) -> ActionResult<Option<NcrDetail>> {
    let Some(summary) = store.ncr_summaries()?.into_iter().find(|n| &n.ncr.id == id) else {
        return Ok(None);
    };
    let inspection = store.get::<Inspection>(&summary.ncr.inspection_id)?;
    let evidence = store.ncr_evidence(id)?;
    Ok(Some(NcrDetail {
        summary,
        inspection,
        evidence,
    }))
}

/// Raise an NCR. In manual mode the backing inspection (result FAIL) and the
/// NCR are written atomically.
pub fn create_ncr(store: &Store, request: NcrRequest) -> ActionResult<Created<Ncr>> {
    let description = actions::required("Description", &request.description)?;
    if let Some(material_id) = &request.material_id {
        actions::require::<Material>(store, material_id)?;
    }

    store.transaction(|s| {
        let inspection_id = match &request.source {
            NcrSource::Existing(id) => {
                actions::require::<Inspection>(s, id)?;
                id.clone()
            }
            NcrSource::Manual {
                project_id,
                inspector_id,
            } => {
                let mut inspection = Inspection::new(project_id.clone(), inspector_id.clone());
                inspection.result = InspectionResult::Fail;
                inspection.material_id = request.material_id.clone();
                inspection.notes = "Recorded with NCR".to_string();
                check_inspection(s, &inspection)?;
                let created = actions::insert(s, inspection)?;
                tracing::debug!(short_id = %created.short_id, "recorded inspection for manual NCR");
                created.record.id
            }
        };

        let number = match request.ncr_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                let now = Utc::now();
                let year = chrono::Datelike::year(&now);
                next_ncr_number(now, s.last_ncr_sequence(year)?).ok_or_else(|| {
                    ActionError::rejected(format!(
                        "No NCR numbers left for {}; give one with --number",
                        year
                    ))
                })?
            }
        };

        let mut ncr = Ncr::new(number.clone(), description.clone(), inspection_id);
        ncr.root_cause = request.root_cause.trim().to_string();
        ncr.corrective_action = request.corrective_action.trim().to_string();
        ncr.material_id = request.material_id.clone();
        if request.status != NcrStatus::Open {
            ncr.set_status(request.status);
        }

        actions::insert(s, ncr)
            .map_err(|e| e.on_constraint(|| format!("NCR number {} already exists", number)))
    })
}

pub fn update_ncr(store: &Store, ncr: &mut Ncr) -> ActionResult<()> {
    actions::required("Description", &ncr.description)?;
    actions::required("NCR number", &ncr.ncr_number)?;
    ncr.updated = Utc::now();
    let number = ncr.ncr_number.clone();
    actions::update(store, &*ncr)
        .map_err(|e| e.on_constraint(|| format!("NCR number {} already exists", number)))
}

/// Move an NCR to a new status, stamping `closed_at` as needed
pub fn set_ncr_status(store: &Store, id: &EntityId, status: NcrStatus) -> ActionResult<Ncr> {
    let mut ncr: Ncr = actions::fetch(store, id)?;
    ncr.set_status(status);
    actions::update(store, &ncr)?;
    Ok(ncr)
}

pub fn delete_ncr(store: &Store, id: &EntityId) -> ActionResult<()> {
    actions::delete::<Ncr>(store, id, || "NCR is still referenced".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Client, ItpStatus};
    use tempfile::tempdir;

    struct Fixture {
        store: Store,
        project: Project,
        inspector: Inspector,
    }

    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        let client = Client::new("Acme".to_string());
        store.insert(&client).unwrap();
        let project = Project::new("Tank farm".to_string(), client.id.clone());
        store.insert(&project).unwrap();
        let inspector = Inspector::new("R. Chen".to_string(), "QC".to_string());
        store.insert(&inspector).unwrap();
        Fixture {
            store,
            project,
            inspector,
        }
    }

    fn request(source: NcrSource) -> NcrRequest {
        NcrRequest {
            ncr_number: None,
            description: "Undercut on weld W-12".to_string(),
            root_cause: String::new(),
            corrective_action: String::new(),
            status: NcrStatus::Open,
            material_id: None,
            source,
        }
    }

    #[test]
    fn test_manual_ncr_creates_failed_inspection() {
        let f = fixture();
        let created = create_ncr(
            &f.store,
            request(NcrSource::Manual {
                project_id: f.project.id.clone(),
                inspector_id: f.inspector.id.clone(),
            }),
        )
        .unwrap();

        let inspection = actions::fetch::<Inspection>(&f.store, &created.record.inspection_id).unwrap();
        assert_eq!(inspection.result, InspectionResult::Fail);
        assert!(created.record.ncr_number.starts_with("NCR-"));
        assert!(created.record.ncr_number.ends_with("-0001"));
    }

    #[test]
    fn test_failed_ncr_insert_rolls_back_inspection() {
        let f = fixture();
        let mut first = request(NcrSource::Manual {
            project_id: f.project.id.clone(),
            inspector_id: f.inspector.id.clone(),
        });
        first.ncr_number = Some("NCR-X".to_string());
        create_ncr(&f.store, first.clone()).unwrap();

        let err = create_ncr(&f.store, first).unwrap_err();
        assert_eq!(err.user_message(), "NCR number NCR-X already exists");
        assert_eq!(get_inspections(&f.store).unwrap().len(), 1);
    }

    #[test]
    fn test_existing_inspection_must_exist() {
        let f = fixture();
        let err = create_ncr(
            &f.store,
            request(NcrSource::Existing(EntityId::new(EntityPrefix::Ins))),
        )
        .unwrap_err();
        assert!(matches!(err, ActionError::Rejected(_)));
        assert!(get_ncrs(&f.store).unwrap().is_empty());
    }

    #[test]
    fn test_generated_numbers_increment() {
        let f = fixture();
        let inspection = create_inspection(
            &f.store,
            Inspection::new(f.project.id.clone(), f.inspector.id.clone()),
        )
        .unwrap()
        .record;
        let a = create_ncr(&f.store, request(NcrSource::Existing(inspection.id.clone()))).unwrap();
        let b = create_ncr(&f.store, request(NcrSource::Existing(inspection.id.clone()))).unwrap();
        assert!(a.record.ncr_number.ends_with("-0001"));
        assert!(b.record.ncr_number.ends_with("-0002"));
    }

    #[test]
    fn test_exhausted_number_sequence_is_rejected() {
        let f = fixture();
        let inspection = create_inspection(
            &f.store,
            Inspection::new(f.project.id.clone(), f.inspector.id.clone()),
        )
        .unwrap()
        .record;
        let year = chrono::Datelike::year(&Utc::now());
        let mut last = request(NcrSource::Existing(inspection.id.clone()));
        last.ncr_number = Some(format!("NCR-{}-{}", year, usize::MAX));
        create_ncr(&f.store, last).unwrap();

        let err = create_ncr(&f.store, request(NcrSource::Existing(inspection.id.clone())))
            .unwrap_err();
        assert!(matches!(err, ActionError::Rejected(_)));
        assert!(err.user_message().contains("--number"));
        assert_eq!(get_ncrs(&f.store).unwrap().len(), 1);
    }

    #[test]
    fn test_close_and_reopen() {
        let f = fixture();
        let created = create_ncr(
            &f.store,
            request(NcrSource::Manual {
                project_id: f.project.id.clone(),
                inspector_id: f.inspector.id.clone(),
            }),
        )
        .unwrap();
        let closed = set_ncr_status(&f.store, &created.record.id, NcrStatus::Closed).unwrap();
        assert!(closed.closed_at.is_some());
        let reopened = set_ncr_status(&f.store, &created.record.id, NcrStatus::Open).unwrap();
        assert!(reopened.closed_at.is_none());
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let f = fixture();
        let itp = create_itp(&f.store, Itp::new("Tank T-101".to_string())).unwrap().record;
        for stage in ["Material receipt", "Fit-up", "Welding", "NDT"] {
            add_itp_item(&f.store, ItpItem::new(itp.id.clone(), stage.to_string())).unwrap();
        }
        let detail = get_itp_detail(&f.store, &itp.id).unwrap().unwrap();
        let stages: Vec<_> = detail.items.iter().map(|i| i.stage.as_str()).collect();
        assert_eq!(stages, ["Material receipt", "Fit-up", "Welding", "NDT"]);
        assert_eq!(detail.items[3].seq, 4);
        assert_eq!(detail.itp.status, ItpStatus::Draft);
    }

    #[test]
    fn test_attach_evidence_directory() {
        let f = fixture();
        let itp = create_itp(&f.store, Itp::new("ITP".to_string())).unwrap().record;
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"world!").unwrap();

        let attached = attach_evidence(&f.store, EvidenceOwner::Itp(itp.id.clone()), dir.path()).unwrap();
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].record.file_name, "a.txt");
        assert_eq!(attached[0].record.size_bytes, 5);
        assert_eq!(
            attached[0].record.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let detail = get_itp_detail(&f.store, &itp.id).unwrap().unwrap();
        assert_eq!(detail.evidence.len(), 2);
    }

    #[test]
    fn test_missing_itp_detail_is_none() {
        let f = fixture();
        assert!(get_itp_detail(&f.store, &EntityId::new(EntityPrefix::Itp))
            .unwrap()
            .is_none());
    }
}
