//! Form state for every create/edit modal
//!
//! Each form holds what the user typed or selected. `build` turns a create
//! form into a new record and `apply` copies an edit form onto the record it
//! was opened from.

use chrono::{Local, NaiveDate};

use crate::actions::qc::{NcrRequest, NcrSource};
use crate::core::identity::EntityId;
use crate::entities::{
    Approval, Client, Discipline, Drawing, Inspection, InspectionResult, Inspector,
    InspectorStatus, Itp, ItpItem, ItpStatus, Material, MaterialFields, MdrPayload, MdrReport,
    Ncr, NcrStatus, Project, ProjectStatus, ReportStatus, WeldProcess, Welder, Wps, WpsStatus,
};
use crate::views::modal::{Form, FormError};

fn required(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

fn selected(what: &'static str, value: &Option<EntityId>) -> Result<(), FormError> {
    if value.is_none() {
        return Err(FormError::SelectFirst(what));
    }
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ===== Clients and projects =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub contact: String,
}

impl ClientForm {
    pub fn build(&self) -> Client {
        let mut client = Client::new(self.name.trim().to_string());
        self.apply(&mut client);
        client
    }

    pub fn apply(&self, client: &mut Client) {
        client.name = self.name.trim().to_string();
        client.email = optional(&self.email);
        client.contact = optional(&self.contact);
    }
}

impl Form for ClientForm {
    type Record = Client;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone().unwrap_or_default(),
            contact: client.contact.clone().unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub location: String,
    pub status: ProjectStatus,
    pub client: Option<EntityId>,
}

impl ProjectForm {
    /// Only valid after [`Form::validate`] succeeded
    pub fn build(&self) -> Option<Project> {
        let mut project = Project::new(self.name.trim().to_string(), self.client.clone()?);
        self.apply(&mut project);
        Some(project)
    }

    pub fn apply(&self, project: &mut Project) {
        project.name = self.name.trim().to_string();
        project.location = optional(&self.location);
        project.status = self.status;
        if let Some(client) = &self.client {
            project.client_id = client.clone();
        }
    }
}

impl Form for ProjectForm {
    type Record = Project;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            location: project.location.clone().unwrap_or_default(),
            status: project.status,
            client: Some(project.client_id.clone()),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        selected("client", &self.client)?;
        required("Project name", &self.name)
    }
}

// ===== Master data =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialForm {
    pub project: Option<EntityId>,
    pub fields: MaterialFields,
}

impl MaterialForm {
    pub fn build(&self) -> Material {
        let mut material = Material::new(MaterialFields::default());
        self.apply(&mut material);
        material
    }

    pub fn apply(&self, material: &mut Material) {
        material.project_id = self.project.clone();
        material.fields = self.fields.clone();
    }
}

impl Form for MaterialForm {
    type Record = Material;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(material: &Material) -> Self {
        Self {
            project: material.project_id.clone(),
            fields: material.fields.clone(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Mark no", &self.fields.mark_no)?;
        if self.fields.quantity <= 0 {
            return Err(FormError::Invalid(
                "Quantity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Keep the project for consecutive entries of one mark list
    fn reset_after_success(&mut self) {
        let project = self.project.take();
        *self = Self::blank();
        self.project = project;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WelderForm {
    pub name: String,
    pub cert_id: String,
    pub score: f64,
}

impl WelderForm {
    pub fn build(&self) -> Welder {
        let mut welder = Welder::new(String::new(), String::new());
        self.apply(&mut welder);
        welder
    }

    pub fn apply(&self, welder: &mut Welder) {
        welder.name = self.name.trim().to_string();
        welder.cert_id = self.cert_id.trim().to_string();
        welder.score = self.score;
    }
}

impl Form for WelderForm {
    type Record = Welder;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(welder: &Welder) -> Self {
        Self {
            name: welder.name.clone(),
            cert_id: welder.cert_id.clone(),
            score: welder.score,
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Name", &self.name)?;
        required("Certification ID", &self.cert_id)?;
        if !(0.0..=100.0).contains(&self.score) {
            return Err(FormError::Invalid(
                "Score must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectorForm {
    pub name: String,
    pub email: String,
    pub role: String,
    pub certification: String,
    pub status: InspectorStatus,
}

impl InspectorForm {
    pub fn build(&self) -> Inspector {
        let mut inspector = Inspector::new(String::new(), String::new());
        self.apply(&mut inspector);
        inspector
    }

    pub fn apply(&self, inspector: &mut Inspector) {
        inspector.name = self.name.trim().to_string();
        inspector.email = optional(&self.email);
        inspector.role = self.role.trim().to_string();
        inspector.certification = optional(&self.certification);
        inspector.status = self.status;
    }
}

impl Form for InspectorForm {
    type Record = Inspector;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(inspector: &Inspector) -> Self {
        Self {
            name: inspector.name.clone(),
            email: inspector.email.clone().unwrap_or_default(),
            role: inspector.role.clone(),
            certification: inspector.certification.clone().unwrap_or_default(),
            status: inspector.status,
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Name", &self.name)?;
        required("Role", &self.role)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpsForm {
    pub number: String,
    pub process: WeldProcess,
    pub filler_metal: String,
    pub position: String,
    pub status: WpsStatus,
}

impl WpsForm {
    pub fn build(&self) -> Wps {
        let mut wps = Wps::new(String::new(), self.process);
        self.apply(&mut wps);
        wps
    }

    pub fn apply(&self, wps: &mut Wps) {
        wps.number = self.number.trim().to_string();
        wps.process = self.process;
        wps.filler_metal = self.filler_metal.trim().to_string();
        wps.position = self.position.trim().to_string();
        wps.status = self.status;
    }
}

impl Form for WpsForm {
    type Record = Wps;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(wps: &Wps) -> Self {
        Self {
            number: wps.number.clone(),
            process: wps.process,
            filler_metal: wps.filler_metal.clone(),
            position: wps.position.clone(),
            status: wps.status,
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("WPS number", &self.number)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingForm {
    pub number: String,
    pub title: String,
    pub revision: u32,
    pub project: Option<EntityId>,
}

impl DrawingForm {
    pub fn build(&self) -> Drawing {
        let mut drawing = Drawing::new(String::new(), String::new());
        self.apply(&mut drawing);
        drawing
    }

    pub fn apply(&self, drawing: &mut Drawing) {
        drawing.number = self.number.trim().to_string();
        drawing.title = self.title.trim().to_string();
        drawing.revision = self.revision;
        drawing.project_id = self.project.clone();
    }
}

impl Form for DrawingForm {
    type Record = Drawing;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(drawing: &Drawing) -> Self {
        Self {
            number: drawing.number.clone(),
            title: drawing.title.clone(),
            revision: drawing.revision,
            project: drawing.project_id.clone(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Drawing number", &self.number)?;
        required("Title", &self.title)
    }
}

// ===== ITPs =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItpForm {
    pub title: String,
    pub status: ItpStatus,
    pub project: Option<EntityId>,
}

impl ItpForm {
    pub fn build(&self) -> Itp {
        let mut itp = Itp::new(String::new());
        self.apply(&mut itp);
        itp
    }

    pub fn apply(&self, itp: &mut Itp) {
        itp.title = self.title.trim().to_string();
        itp.status = self.status;
        itp.project_id = self.project.clone();
    }
}

impl Form for ItpForm {
    type Record = Itp;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(itp: &Itp) -> Self {
        Self {
            title: itp.title.clone(),
            status: itp.status,
            project: itp.project_id.clone(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        required("Title", &self.title)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItpItemForm {
    pub itp: Option<EntityId>,
    pub stage: String,
    pub description: String,
    pub hold_point: bool,
    pub witness_point: bool,
    pub surveillance: bool,
    pub approval: Approval,
}

impl ItpItemForm {
    pub fn build(&self) -> Option<ItpItem> {
        let mut item = ItpItem::new(self.itp.clone()?, String::new());
        self.apply(&mut item);
        Some(item)
    }

    pub fn apply(&self, item: &mut ItpItem) {
        item.stage = self.stage.trim().to_string();
        item.description = self.description.trim().to_string();
        item.hold_point = self.hold_point;
        item.witness_point = self.witness_point;
        item.surveillance = self.surveillance;
        item.approval = self.approval;
    }
}

impl Form for ItpItemForm {
    type Record = ItpItem;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(item: &ItpItem) -> Self {
        Self {
            itp: Some(item.itp_id.clone()),
            stage: item.stage.clone(),
            description: item.description.clone(),
            hold_point: item.hold_point,
            witness_point: item.witness_point,
            surveillance: item.surveillance,
            approval: item.approval,
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        selected("ITP", &self.itp)?;
        required("Stage", &self.stage)
    }

    /// Stay on the same ITP when adding several items
    fn reset_after_success(&mut self) {
        let itp = self.itp.take();
        *self = Self::blank();
        self.itp = itp;
    }
}

// ===== Inspections and NCRs =====

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionForm {
    pub project: Option<EntityId>,
    pub inspector: Option<EntityId>,
    pub material: Option<EntityId>,
    pub result: InspectionResult,
    pub inspected_on: NaiveDate,
    pub notes: String,
}

impl InspectionForm {
    pub fn build(&self) -> Option<Inspection> {
        let mut inspection = Inspection::new(self.project.clone()?, self.inspector.clone()?);
        inspection.material_id = self.material.clone();
        inspection.result = self.result;
        inspection.inspected_on = self.inspected_on;
        inspection.notes = self.notes.trim().to_string();
        Some(inspection)
    }
}

impl Form for InspectionForm {
    type Record = Inspection;

    fn blank() -> Self {
        Self {
            project: None,
            inspector: None,
            material: None,
            result: InspectionResult::default(),
            inspected_on: Local::now().date_naive(),
            notes: String::new(),
        }
    }

    fn from_record(inspection: &Inspection) -> Self {
        Self {
            project: Some(inspection.project_id.clone()),
            inspector: Some(inspection.inspector_id.clone()),
            material: inspection.material_id.clone(),
            result: inspection.result,
            inspected_on: inspection.inspected_on,
            notes: inspection.notes.clone(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        selected("project", &self.project)?;
        selected("inspector", &self.inspector)
    }
}

/// Where a new NCR's inspection comes from, as selected in the form
#[derive(Debug, Clone, PartialEq)]
pub enum NcrFormSource {
    Existing(Option<EntityId>),
    Manual {
        project: Option<EntityId>,
        inspector: Option<EntityId>,
    },
}

impl Default for NcrFormSource {
    fn default() -> Self {
        NcrFormSource::Existing(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NcrForm {
    pub ncr_number: String,
    pub description: String,
    pub root_cause: String,
    pub corrective_action: String,
    pub status: NcrStatus,
    pub material: Option<EntityId>,
    pub source: NcrFormSource,
}

impl NcrForm {
    /// The create request; fails exactly when [`Form::validate`] fails
    pub fn request(&self) -> Result<NcrRequest, FormError> {
        self.validate()?;
        let source = match &self.source {
            NcrFormSource::Existing(Some(id)) => NcrSource::Existing(id.clone()),
            NcrFormSource::Manual {
                project: Some(project_id),
                inspector: Some(inspector_id),
            } => NcrSource::Manual {
                project_id: project_id.clone(),
                inspector_id: inspector_id.clone(),
            },
            NcrFormSource::Existing(None) => return Err(FormError::SelectFirst("inspection")),
            NcrFormSource::Manual { project: None, .. } => {
                return Err(FormError::SelectFirst("project"))
            }
            NcrFormSource::Manual { inspector: None, .. } => {
                return Err(FormError::SelectFirst("inspector"))
            }
        };
        Ok(NcrRequest {
            ncr_number: optional(&self.ncr_number),
            description: self.description.trim().to_string(),
            root_cause: self.root_cause.trim().to_string(),
            corrective_action: self.corrective_action.trim().to_string(),
            status: self.status,
            material_id: self.material.clone(),
            source,
        })
    }

    /// Copy the editable fields onto an existing NCR
    pub fn apply(&self, ncr: &mut Ncr) {
        if let Some(number) = optional(&self.ncr_number) {
            ncr.ncr_number = number;
        }
        ncr.description = self.description.trim().to_string();
        ncr.root_cause = self.root_cause.trim().to_string();
        ncr.corrective_action = self.corrective_action.trim().to_string();
        ncr.material_id = self.material.clone();
        if ncr.status != self.status {
            ncr.set_status(self.status);
        }
    }
}

impl Form for NcrForm {
    type Record = Ncr;

    fn blank() -> Self {
        Self::default()
    }

    fn from_record(ncr: &Ncr) -> Self {
        Self {
            ncr_number: ncr.ncr_number.clone(),
            description: ncr.description.clone(),
            root_cause: ncr.root_cause.clone(),
            corrective_action: ncr.corrective_action.clone(),
            status: ncr.status,
            material: ncr.material_id.clone(),
            source: NcrFormSource::Existing(Some(ncr.inspection_id.clone())),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        match &self.source {
            NcrFormSource::Existing(inspection) => selected("inspection", inspection)?,
            NcrFormSource::Manual { project, inspector } => {
                selected("project", project)?;
                selected("inspector", inspector)?;
            }
        }
        required("Description", &self.description)
    }
}

// ===== MDR reports =====

#[derive(Debug, Clone, PartialEq)]
pub struct MdrForm {
    pub project: Option<EntityId>,
    pub inspector: Option<EntityId>,
    pub status: ReportStatus,
    pub payload: MdrPayload,
}

impl MdrForm {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            project: None,
            inspector: None,
            status: ReportStatus::Pending,
            payload: MdrPayload::empty(discipline),
        }
    }

    pub fn discipline(&self) -> Discipline {
        self.payload.discipline()
    }

    pub fn build(&self) -> Option<MdrReport> {
        let mut report = MdrReport::new(
            self.payload.clone(),
            self.project.clone()?,
            self.inspector.clone()?,
        );
        report.status = self.status;
        Some(report)
    }

    pub fn apply(&self, report: &mut MdrReport) {
        if let Some(project) = &self.project {
            report.project_id = project.clone();
        }
        if let Some(inspector) = &self.inspector {
            report.inspector_id = inspector.clone();
        }
        report.status = self.status;
        // An untouched payload keeps whatever is stored, readable or not
        if self.payload != report.data {
            report.replace_payload(self.payload.clone());
        }
    }
}

impl Form for MdrForm {
    type Record = MdrReport;

    /// A blank cutting report; use [`MdrForm::new`] for other disciplines
    fn blank() -> Self {
        Self::new(Discipline::Cutting)
    }

    fn from_record(report: &MdrReport) -> Self {
        Self {
            project: Some(report.project_id.clone()),
            inspector: Some(report.inspector_id.clone()),
            status: report.status,
            payload: report.data.clone(),
        }
    }

    fn validate(&self) -> Result<(), FormError> {
        selected("project", &self.project)?;
        selected("inspector", &self.inspector)?;
        let discipline = self.discipline();
        if !discipline.allows(self.status) {
            return Err(FormError::Invalid(format!(
                "{} is not a {} status. Use {}",
                self.status,
                discipline.label(),
                discipline.vocabulary()
            )));
        }
        Ok(())
    }

    /// Clear every field except the project and inspector
    fn reset_after_success(&mut self) {
        let project = self.project.take();
        let inspector = self.inspector.take();
        *self = Self::new(self.discipline());
        self.project = project;
        self.inspector = inspector;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionError;
    use crate::core::identity::EntityPrefix;
    use crate::views::modal::{Modal, Submitted};
    use crate::views::testing::RecordingNotifier;
    use std::cell::Cell;

    #[test]
    fn test_switching_records_shows_new_values() {
        let mut a = Welder::new("Alice".to_string(), "W-001".to_string());
        a.score = 91.0;
        let b = Welder::new("Bob".to_string(), "W-002".to_string());

        let mut modal: Modal<WelderForm> = Modal::editing(&a);
        modal.form_mut().name = "Alice (edited, unsaved)".to_string();

        modal.edit(&b);
        assert_eq!(modal.form(), &WelderForm::from_record(&b));
        assert_eq!(modal.keyed_to(), Some(&b.id));

        // Re-opening the same record keeps in-progress edits
        modal.form_mut().cert_id = "W-002A".to_string();
        modal.edit(&b);
        assert_eq!(modal.form().cert_id, "W-002A");
    }

    #[test]
    fn test_project_without_client_is_rejected_before_action() {
        let notifier = RecordingNotifier::default();
        let called = Cell::new(false);
        let mut modal: Modal<ProjectForm> = Modal::create();
        modal.form_mut().name = "Tank farm".to_string();

        let outcome = modal.submit(
            &notifier,
            |_| {
                called.set(true);
                Ok(())
            },
            |_| "Project created".to_string(),
        );

        assert!(matches!(
            outcome,
            Submitted::Invalid(FormError::SelectFirst("client"))
        ));
        assert!(!called.get());
        assert_eq!(notifier.errors(), vec!["Please select a client first".to_string()]);
    }

    #[test]
    fn test_manual_ncr_requires_project_and_inspector() {
        let notifier = RecordingNotifier::default();
        let called = Cell::new(false);
        let mut modal: Modal<NcrForm> = Modal::create();
        modal.form_mut().description = "Lamination found".to_string();
        modal.form_mut().source = NcrFormSource::Manual {
            project: Some(EntityId::new(EntityPrefix::Prj)),
            inspector: None,
        };

        let outcome = modal.submit(
            &notifier,
            |form| {
                called.set(true);
                form.request().map_err(|e| ActionError::rejected(e.to_string()))
            },
            |_| "NCR created".to_string(),
        );

        assert!(matches!(outcome, Submitted::Invalid(FormError::SelectFirst("inspector"))));
        assert!(!called.get());

        modal.form_mut().source = NcrFormSource::Manual {
            project: None,
            inspector: Some(EntityId::new(EntityPrefix::Qci)),
        };
        assert_eq!(modal.form().request().unwrap_err(), FormError::SelectFirst("project"));
    }

    #[test]
    fn test_ncr_request_in_manual_mode() {
        let project = EntityId::new(EntityPrefix::Prj);
        let inspector = EntityId::new(EntityPrefix::Qci);
        let form = NcrForm {
            description: " Undercut ".to_string(),
            source: NcrFormSource::Manual {
                project: Some(project.clone()),
                inspector: Some(inspector.clone()),
            },
            ..NcrForm::default()
        };
        let request = form.request().unwrap();
        assert_eq!(request.description, "Undercut");
        assert!(request.ncr_number.is_none());
        assert!(matches!(
            request.source,
            NcrSource::Manual { project_id, inspector_id }
                if project_id == project && inspector_id == inspector
        ));
    }

    #[test]
    fn test_mdr_reset_keeps_project_and_inspector() {
        let notifier = RecordingNotifier::default();
        let project = EntityId::new(EntityPrefix::Prj);
        let inspector = EntityId::new(EntityPrefix::Qci);
        let mut modal: Modal<MdrForm> = Modal::create();
        *modal.form_mut() = MdrForm::new(Discipline::Fitup);
        modal.form_mut().project = Some(project.clone());
        modal.form_mut().inspector = Some(inspector.clone());
        modal.form_mut().status = ReportStatus::Pass;
        modal.form_mut().payload.set_field("joint_no", "J-14").unwrap();

        let outcome = modal.submit(&notifier, |_| Ok(()), |_| "Report saved".to_string());
        assert!(matches!(outcome, crate::views::Submitted::Saved(_)));

        let form = modal.form();
        assert_eq!(form.project, Some(project));
        assert_eq!(form.inspector, Some(inspector));
        assert_eq!(form.status, ReportStatus::Pending);
        assert_eq!(form.payload, MdrPayload::empty(Discipline::Fitup));
    }

    #[test]
    fn test_failed_submit_keeps_form() {
        let notifier = RecordingNotifier::default();
        let mut modal: Modal<WpsForm> = Modal::create();
        modal.form_mut().number = "WPS-CS-001".to_string();

        let outcome: Submitted<()> = modal.submit(
            &notifier,
            |_| Err(ActionError::rejected("WPS WPS-CS-001 already exists")),
            |_| String::new(),
        );

        assert!(matches!(outcome, Submitted::Failed));
        assert_eq!(modal.form().number, "WPS-CS-001");
        assert_eq!(notifier.errors(), vec!["WPS WPS-CS-001 already exists".to_string()]);
    }

    #[test]
    fn test_mdr_status_outside_vocabulary() {
        let mut form = MdrForm::new(Discipline::Painting);
        form.project = Some(EntityId::new(EntityPrefix::Prj));
        form.inspector = Some(EntityId::new(EntityPrefix::Qci));
        form.status = ReportStatus::Reject;
        assert!(matches!(form.validate(), Err(FormError::Invalid(_))));
        form.status = ReportStatus::Hold;
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_material_quantity_must_be_positive() {
        let mut form = MaterialForm::blank();
        form.fields.mark_no = "B1".to_string();
        assert!(matches!(form.validate(), Err(FormError::Invalid(_))));
        form.fields.quantity = 2;
        assert!(form.validate().is_ok());
    }
}
