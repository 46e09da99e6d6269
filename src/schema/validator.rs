//! Schema validation of MDR payloads with detailed error reporting

use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::entities::Discipline;
use crate::schema::registry::SchemaRegistry;

/// Validation error with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(qcd::schema::validation_error))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    pub fn new(name: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            src: NamedSource::new(name, source.to_string()),
            violations,
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Plain violation messages, for machine-readable output
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }
}

/// Schema validator with compiled schemas
pub struct Validator {
    /// Compiled JSON schemas by discipline
    compiled: HashMap<Discipline, JsonValidator>,
}

impl Validator {
    /// Create a new validator with schemas from the registry
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for discipline in Discipline::all() {
            let Some(schema_str) = registry.get(*discipline) else {
                continue;
            };
            let schema_json = match serde_json::from_str::<JsonValue>(schema_str) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(%discipline, error = %e, "embedded schema is not valid JSON");
                    continue;
                }
            };
            match validator_for(&schema_json) {
                Ok(validator) => {
                    compiled.insert(*discipline, validator);
                }
                Err(e) => tracing::warn!(%discipline, error = %e, "embedded schema does not compile"),
            }
        }

        Self { compiled }
    }

    pub fn has_schema(&self, discipline: Discipline) -> bool {
        self.compiled.contains_key(&discipline)
    }

    /// Validate a stored `data` payload, collecting every violation.
    ///
    /// The source shown in diagnostics is the pretty-printed payload so that
    /// labels point at individual keys.
    pub fn validate(&self, raw: &str, name: &str, discipline: Discipline) -> Result<(), ValidationError> {
        let value: JsonValue = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                let span = find_error_span(raw, e.line(), e.column());
                let violation = SchemaViolation::new(
                    format!("JSON parse error: {}", e),
                    "invalid JSON".to_string(),
                    span,
                    Some("The payload was read with default values for every field".to_string()),
                );
                return Err(ValidationError::new(name, raw, vec![violation]));
            }
        };

        let source = serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string());

        let Some(schema) = self.compiled.get(&discipline) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&value)
            .map(|e| error_to_violation(&source, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(name, &source, violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        let registry = SchemaRegistry::default();
        Self::new(&registry)
    }
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    let message = format_schema_error(error);
    let hint = format_error_hint(error);
    let help = generate_help_message(error);
    let span = find_path_span(content, &path);

    SchemaViolation::new(message, hint, span, help)
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(error: &JsonSchemaError) -> String {
    let path = if error.instance_path.as_str().is_empty() {
        "payload root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("Missing required field: {} at {}", prop_str, path)
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            format!("Wrong type at {}: expected {:?}", path, kind)
        }
        jsonschema::error::ValidationErrorKind::Minimum { limit } => {
            format!("Value at {} is too small: minimum {}", path, limit)
        }
        jsonschema::error::ValidationErrorKind::Maximum { limit } => {
            format!("Value at {} is too large: maximum {}", path, limit)
        }
        _ => format!("Validation error at {}: {}", path, error),
    }
}

/// Generate a short hint for the error label
fn format_error_hint(error: &JsonSchemaError) -> String {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { .. } => "required field missing".to_string(),
        jsonschema::error::ValidationErrorKind::Type { .. } => "wrong type".to_string(),
        jsonschema::error::ValidationErrorKind::Minimum { .. }
        | jsonschema::error::ValidationErrorKind::Maximum { .. } => "out of range".to_string(),
        _ => "validation error".to_string(),
    }
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Edit the report and set '{}'", prop_str))
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            Some(format!("Expected value of type: {:?}; the field reads as its default", kind))
        }
        _ => None,
    }
}

/// Find the span for a serde_json error position (1-based line and column)
fn find_error_span(content: &str, line: usize, column: usize) -> SourceSpan {
    let line = line.saturating_sub(1);
    let column = column.saturating_sub(1);

    let mut offset = 0;
    for (i, line_content) in content.lines().enumerate() {
        if i == line {
            offset += column.min(line_content.len());
            break;
        }
        offset += line_content.len() + 1;
    }
    let offset = offset.min(content.len());
    let len = if offset < content.len() { 1 } else { 0 };
    (offset, len).into()
}

/// Find the span for a JSON pointer in pretty-printed JSON
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    let key = json_path.split('/').filter(|s| !s.is_empty()).last();

    if let Some(span) = key.and_then(|k| find_key_span(content, k)) {
        return span;
    }

    // Root or unknown key: highlight the first line
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len.min(content.len())).into()
}

/// Find the span of `"key": value` in pretty-printed JSON
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let pattern = format!("\"{}\":", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&pattern) {
            let start = offset + (line.len() - trimmed.len());
            return Some((start, trimmed.trim_end_matches(',').len()).into());
        }
        offset += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_creation() {
        let validator = Validator::default();
        for discipline in Discipline::all() {
            assert!(validator.has_schema(*discipline), "{} has no schema", discipline);
        }
    }

    #[test]
    fn test_valid_painting_payload() {
        let validator = Validator::default();
        let raw = r#"{"area":"Deck","system":"EP-1","coat":"primer","temp":21.5,"humidity":60,"thickness":75,"remarks":""}"#;
        assert!(validator.validate(raw, "MDR@1", Discipline::Painting).is_ok());
    }

    #[test]
    fn test_humidity_out_of_range() {
        let validator = Validator::default();
        let raw = r#"{"area":"Deck","humidity":140}"#;
        let err = validator
            .validate(raw, "MDR@1", Discipline::Painting)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
        assert!(err.messages()[0].contains("humidity"));
    }

    #[test]
    fn test_string_number_is_reported() {
        let validator = Validator::default();
        let raw = r#"{"joint_no":"J1","gap":"3.5"}"#;
        let err = validator.validate(raw, "MDR@2", Discipline::Fitup).unwrap_err();
        assert!(err.messages()[0].contains("Wrong type"));
    }

    #[test]
    fn test_missing_required_field() {
        let validator = Validator::default();
        let err = validator
            .validate(r#"{"method":"RT"}"#, "MDR@3", Discipline::Ndt)
            .unwrap_err();
        assert!(err.messages()[0].contains("joint_no"));
    }

    #[test]
    fn test_invalid_json() {
        let validator = Validator::default();
        let err = validator
            .validate("{not json", "MDR@4", Discipline::Welding)
            .unwrap_err();
        assert!(err.messages()[0].starts_with("JSON parse error"));
    }

    #[test]
    fn test_key_span_points_at_key() {
        let content = "{\n  \"area\": \"Deck\",\n  \"humidity\": 140\n}";
        let span = find_path_span(content, "/humidity");
        assert_eq!(&content[span.offset()..span.offset() + span.len()], "\"humidity\": 140");
    }
}
