//! Schema system - JSON Schema validation of stored MDR payloads

pub mod registry;
pub mod validator;

pub use registry::SchemaRegistry;
pub use validator::{SchemaViolation, ValidationError, Validator};
