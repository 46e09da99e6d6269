//! QC Dashboard: fabrication quality records
//!
//! A command-line tool for managing the quality records of a mechanical
//! fabrication shop: inspection and test plans, inspections, NCRs and the
//! per-discipline manufacturing data reports, kept in a local SQLite
//! workspace.

pub mod actions;
pub mod cli;
pub mod core;
pub mod entities;
pub mod export;
pub mod import;
pub mod schema;
pub mod store;
pub mod views;
