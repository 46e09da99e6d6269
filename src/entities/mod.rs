//! Entity type definitions
//!
//! QCD manages the following entity types:
//!
//! **Master data:**
//! - [`Client`] - Project owners
//! - [`Project`] - Fabrication projects, each owned by one client
//! - [`Material`] - Mark list entries (flat attribute bag)
//! - [`Welder`] - Certified welders with derived repair metrics
//! - [`Inspector`] - QC inspectors
//! - [`Wps`] - Welding Procedure Specifications
//! - [`Drawing`] - Controlled drawings and their revisions
//!
//! **Quality control:**
//! - [`Itp`] - Inspection Test Plans with ordered [`ItpItem`]s and [`Evidence`]
//! - [`Inspection`] - Inspection events
//! - [`Ncr`] - Non-Conformance Reports, each backed by an inspection
//! - [`MdrReport`] - Discipline-tagged Manufacturing Data Reports

pub mod client;
pub mod drawing;
pub mod inspection;
pub mod inspector;
pub mod itp;
pub mod material;
pub mod mdr;
pub mod ncr;
pub mod project;
pub mod welder;
pub mod wps;

pub use client::{Client, ClientSummary};
pub use drawing::Drawing;
pub use inspection::{Inspection, InspectionResult, InspectionSummary};
pub use inspector::{Inspector, InspectorStatus};
pub use itp::{Approval, Evidence, Itp, ItpItem, ItpStatus, ItpSummary};
pub use material::{Material, MaterialFields};
pub use mdr::{Discipline, FieldError, Integrity, MdrPayload, MdrReport, MdrSummary, Outcome, ReportStatus};
pub use ncr::{Ncr, NcrStatus, NcrSummary};
pub use project::{Project, ProjectStatus, ProjectSummary};
pub use welder::{Standing, Welder, WelderSummary};
pub use wps::{WeldProcess, Wps, WpsStatus};
