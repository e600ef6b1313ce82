//! JSON Schema generation and validation.
//!
//! The schema is derived from the [`Config`](crate::model::Config) type, so
//! the typed model and the validation rules never drift apart.

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::model::Config;

/// Errors raised while producing or compiling the schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to serialize schema: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to compile schema: {0}")]
    Compile(String),
}

/// Outcome of validating a document against the schema.
///
/// An invalid report is informational; producing output does not depend on
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether the document satisfied the schema.
    pub valid: bool,
    /// One message per violation, empty when `valid`.
    pub diagnostics: Vec<String>,
}

impl ValidationReport {
    /// A report for a document that was not checked.
    pub fn skipped() -> Self {
        Self {
            valid: true,
            diagnostics: Vec::new(),
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.valid {
            return write!(f, "valid");
        }
        write!(f, "{} schema violation(s)", self.diagnostics.len())?;
        for diag in &self.diagnostics {
            write!(f, "\n  - {diag}")?;
        }
        Ok(())
    }
}

/// Generate the JSON Schema (draft 2020-12) of the current file format.
pub fn schema() -> Result<Value, SchemaError> {
    let schema = schemars::schema_for!(Config);
    Ok(serde_json::to_value(&schema)?)
}

/// Compiled schema, reusable across documents.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Compile the schema of the current file format.
    pub fn new() -> Result<Self, SchemaError> {
        Self::with_schema(&schema()?)
    }

    /// Compile an explicitly provided schema.
    pub fn with_schema(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Check `doc` and collect every violation.
    pub fn validate(&self, doc: &Value) -> ValidationReport {
        let diagnostics: Vec<String> = self
            .validator
            .iter_errors(doc)
            .map(|err| err.to_string())
            .collect();
        if !diagnostics.is_empty() {
            debug!("schema validation found {} issue(s)", diagnostics.len());
        }
        ValidationReport {
            valid: diagnostics.is_empty(),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn validator() -> SchemaValidator {
        let _ = env_logger::builder().is_test(true).try_init();
        SchemaValidator::new().unwrap()
    }

    fn minimal() -> Value {
        json!({
            "version": 1,
            "nodes": [{
                "address": "localhost",
                "port": 20401,
                "windows": [{
                    "size": { "x": 1280, "y": 720 },
                    "viewports": [{
                        "projection": {
                            "type": "PlanarProjection",
                            "fov": { "hfov": 80, "vfov": 50 }
                        }
                    }]
                }]
            }]
        })
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let validator = validator();
        let report = validator.validate(&minimal());
        assert!(report.valid, "{report}");
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_wrong_version_is_reported() {
        let validator = validator();
        let mut doc = minimal();
        doc["version"] = json!(2);
        let report = validator.validate(&doc);
        assert!(!report.valid);
        assert!(!report.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_projection_type_is_reported() {
        let validator = validator();
        let mut doc = minimal();
        doc["nodes"][0]["windows"][0]["viewports"][0]["projection"]["type"] = json!("Holographic");
        assert!(!validator.validate(&doc).valid);
    }

    #[test]
    fn test_viewport_without_projection_is_reported() {
        let validator = validator();
        let mut doc = minimal();
        doc["nodes"][0]["windows"][0]["viewports"][0] = json!({ "pos": { "x": 0, "y": 0 } });
        let report = validator.validate(&doc);
        assert!(!report.valid);
        assert!(
            report.diagnostics.iter().any(|d| d.contains("projection")),
            "{report}"
        );
    }

    #[test]
    fn test_missing_nodes_is_reported() {
        let validator = validator();
        let report = validator.validate(&json!({ "version": 1 }));
        assert!(!report.valid);
        assert!(report.to_string().contains("schema violation"));
    }

    #[test]
    fn test_typed_config_round_trips_through_schema() {
        let doc = minimal();
        let config: Config = serde_json::from_value(doc.clone()).unwrap();
        let validator = validator();
        assert!(validator.validate(&serde_json::to_value(&config).unwrap()).valid);
    }
}
