//! CLI command implementations

pub mod common;

pub mod client;
pub mod completions;
pub mod dashboard;
pub mod drawing;
pub mod init;
pub mod inspection;
pub mod inspector;
pub mod itp;
pub mod material;
pub mod mdr;
pub mod ncr;
pub mod project;
pub mod validate;
pub mod welder;
pub mod wps;
