//! Core module - identifiers, the entity contract, workspace and configuration

pub mod config;
pub mod entity;
pub mod identity;
pub mod logging;
pub mod workspace;

pub use config::Config;
pub use entity::Entity;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use workspace::{Workspace, WorkspaceError};
