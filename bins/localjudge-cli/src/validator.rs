//! Structural validation of results documents against the registered
//! JSON schema.
//!
//! Per-run state is explicit: the schema compiles once into a
//! `ValidationContext` that the orchestrator threads through the run, so
//! "validate before register" is impossible by construction. Validation is
//! purely structural (required fields, types, allowed enumerations) and
//! never interprets pass/fail semantics.

use jsonschema::JSONSchema;
use localjudge_common::error::HarnessError;
use localjudge_common::types::SchemaViolation;
use serde_json::Value;
use std::fs;
use std::path::Path;

pub struct ValidationContext {
    schema: JSONSchema,
}

impl std::fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationContext").finish_non_exhaustive()
    }
}

impl ValidationContext {
    /// Compile and register a schema document for the lifetime of the run.
    pub fn register(schema: &Value) -> Result<Self, HarnessError> {
        let schema = JSONSchema::compile(schema)
            .map_err(|e| HarnessError::InvalidSchema(e.to_string()))?;
        Ok(Self { schema })
    }

    /// Load the schema file and register it.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path)?;
        let schema: Value = serde_json::from_str(&content).map_err(|source| HarnessError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::register(&schema)
    }

    /// Check one document; an empty violation list means it conforms.
    pub fn validate(&self, document: &Value) -> Vec<SchemaViolation> {
        match self.schema.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| SchemaViolation {
                    path: e.instance_path.to_string(),
                    reason: e.to_string(),
                })
                .collect(),
        }
    }
}
